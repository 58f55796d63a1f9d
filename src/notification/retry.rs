//! Bounded fixed-delay retry
//!
//! Shared by artifact delivery, channel registration and token registration.
//! Each sequence runs its first attempt inline, then reschedules itself
//! through the injected [`Scheduler`] after a fixed delay, at most
//! `max_attempts` times. The attempt counter only grows.
//!
//! ```text
//! PENDING(0) --ok--> DELIVERED
//!     |
//!    err, attempt < max --(delay)--> PENDING(attempt + 1)
//!     |
//!    err, attempt == max ----------> EXHAUSTED
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::scheduler::Scheduler;

/// Retries after the initial attempt
pub const MAX_ATTEMPTS: u32 = 3;
/// Fixed delay between attempts
pub const RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(rename = "delay_ms", with = "duration_ms")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Attempt counter for one retry sequence. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.max_attempts,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// State for the next attempt, or `None` once the cap is reached
    pub fn next(self) -> Option<Self> {
        self.can_retry().then(|| Self {
            attempt: self.attempt + 1,
            ..self
        })
    }
}

/// Observable phase of a retry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    /// Attempt `attempt` is running or scheduled
    Pending { attempt: u32 },
    /// Succeeded after `attempts` calls
    Delivered { attempts: u32 },
    /// Gave up after `attempts` failed calls
    Exhausted { attempts: u32 },
}

impl RetryPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryPhase::Pending { .. })
    }
}

/// Read side of a running retry sequence
#[derive(Debug, Clone)]
pub struct RetryHandle {
    rx: watch::Receiver<RetryPhase>,
}

impl RetryHandle {
    /// Current phase
    pub fn phase(&self) -> RetryPhase {
        *self.rx.borrow()
    }

    /// Wait for a terminal phase.
    ///
    /// If the scheduler drops the sequence before it finishes (runtime shut
    /// down), the last observed phase is returned.
    pub async fn wait(mut self) -> RetryPhase {
        loop {
            let phase = *self.rx.borrow_and_update();
            if phase.is_terminal() {
                return phase;
            }
            if self.rx.changed().await.is_err() {
                return *self.rx.borrow();
            }
        }
    }
}

struct RetrySequence<F> {
    operation: &'static str,
    policy: RetryPolicy,
    scheduler: Arc<dyn Scheduler>,
    attempt_fn: F,
    phase: watch::Sender<RetryPhase>,
}

impl<F, E> RetrySequence<F>
where
    F: Fn(u32) -> Result<(), E> + Send + Sync + 'static,
    E: std::fmt::Display,
{
    fn step(self: Arc<Self>, state: RetryState) {
        let attempt = state.attempt();
        self.phase.send_replace(RetryPhase::Pending { attempt });

        let error = match (self.attempt_fn)(attempt) {
            Ok(()) => {
                debug!(operation = self.operation, attempts = attempt + 1, "Retry sequence succeeded");
                self.phase.send_replace(RetryPhase::Delivered { attempts: attempt + 1 });
                return;
            }
            Err(e) => e,
        };

        match state.next() {
            Some(next) => {
                warn!(
                    operation = self.operation,
                    attempt,
                    error = %error,
                    retry_in_ms = self.policy.delay.as_millis() as u64,
                    "Attempt failed, retry scheduled"
                );
                self.phase.send_replace(RetryPhase::Pending { attempt: next.attempt() });
                let scheduler = Arc::clone(&self.scheduler);
                let delay = self.policy.delay;
                scheduler.schedule_after(delay, Box::new(move || self.step(next)));
            }
            None => {
                // Dropped here: no escalation beyond this line
                warn!(
                    operation = self.operation,
                    attempts = attempt + 1,
                    error = %error,
                    "Retry attempts exhausted, giving up"
                );
                self.phase.send_replace(RetryPhase::Exhausted { attempts: attempt + 1 });
            }
        }
    }
}

/// Start a retry sequence. The first attempt runs before this returns.
///
/// `attempt_fn` receives the zero-based attempt number and must be safe to
/// call repeatedly.
pub fn start<F, E>(
    operation: &'static str,
    policy: RetryPolicy,
    scheduler: Arc<dyn Scheduler>,
    attempt_fn: F,
) -> RetryHandle
where
    F: Fn(u32) -> Result<(), E> + Send + Sync + 'static,
    E: std::fmt::Display,
{
    let (tx, rx) = watch::channel(RetryPhase::Pending { attempt: 0 });
    let sequence = Arc::new(RetrySequence {
        operation,
        policy,
        scheduler,
        attempt_fn,
        phase: tx,
    });
    sequence.step(RetryState::new(&policy));
    RetryHandle { rx }
}
