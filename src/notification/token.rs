//! Delivery token registration
//!
//! A new token is written locally on every attempt (last write wins) and then
//! forwarded to the backend. Only a failed attempt is retried, with the same
//! bounded fixed-delay policy as artifact delivery. When the final attempt
//! fails the token is parked under [`PENDING_TOKEN_KEY`] so the host can call
//! [`TokenRegistrar::flush_pending`] later, e.g. once connectivity returns.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::retry::{self, RetryHandle, RetryPolicy};
use super::scheduler::Scheduler;
use crate::error::RegistrationError;
use crate::store::{TokenStore, PENDING_TOKEN_KEY, TOKEN_KEY};

/// Backend registration endpoint
pub trait RemoteRegistrar: Send + Sync {
    fn register(&self, token: &str) -> Result<(), RegistrationError>;

    /// Tell the backend to stop sending to `token`
    fn unregister(&self, token: &str) -> Result<(), RegistrationError>;
}

/// Registrar with no transport; every call succeeds
#[derive(Debug, Clone, Default)]
pub struct NoopRegistrar;

impl RemoteRegistrar for NoopRegistrar {
    fn register(&self, token: &str) -> Result<(), RegistrationError> {
        debug!(token_len = token.len(), "No registration endpoint configured, skipping");
        Ok(())
    }

    fn unregister(&self, token: &str) -> Result<(), RegistrationError> {
        debug!(token_len = token.len(), "No registration endpoint configured, skipping");
        Ok(())
    }
}

/// Token registrar
#[derive(Clone)]
pub struct TokenRegistrar {
    store: Arc<dyn TokenStore>,
    remote: Arc<dyn RemoteRegistrar>,
    scheduler: Arc<dyn Scheduler>,
    policy: RetryPolicy,
}

impl TokenRegistrar {
    pub fn new(
        store: Arc<dyn TokenStore>,
        remote: Arc<dyn RemoteRegistrar>,
        scheduler: Arc<dyn Scheduler>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            remote,
            scheduler,
            policy,
        }
    }

    /// Persist and register a freshly issued token
    pub fn on_new_token(&self, token: &str) -> RetryHandle {
        info!(token_len = token.len(), "Received new delivery token");
        self.register(token.to_string())
    }

    /// Retry a registration that previously ran out of attempts
    ///
    /// A parked token that is no longer the current one is discarded.
    pub fn flush_pending(&self) -> Option<RetryHandle> {
        let token = self.store.get(PENDING_TOKEN_KEY)?;
        if self.store.get(TOKEN_KEY).is_some_and(|current| current != token) {
            info!("Discarding stale pending token registration");
            if let Err(e) = self.store.remove(PENDING_TOKEN_KEY) {
                warn!(error = %e, "Failed to clear pending token registration");
            }
            return None;
        }
        info!("Retrying pending token registration");
        Some(self.register(token))
    }

    /// Unregister the current token (e.g. on logout) and remove it locally
    ///
    /// The local slot is cleared even when the backend call fails.
    pub fn unregister(&self) -> Result<Option<String>, RegistrationError> {
        let Some(token) = self.store.get(TOKEN_KEY) else {
            return Ok(None);
        };

        let remote = self.remote.unregister(&token);
        for key in [TOKEN_KEY, PENDING_TOKEN_KEY] {
            self.store
                .remove(key)
                .map_err(|e| RegistrationError::Persist(e.to_string()))?;
        }
        remote?;

        info!("Delivery token unregistered");
        Ok(Some(token))
    }

    /// Currently stored token
    pub fn current_token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    fn register(&self, token: String) -> RetryHandle {
        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        let last_attempt = self.policy.max_attempts;

        retry::start("register_token", self.policy, Arc::clone(&self.scheduler), move |attempt| {
            let result = store
                .set(TOKEN_KEY, &token)
                .map_err(|e| RegistrationError::Persist(e.to_string()))
                .and_then(|()| remote.register(&token));

            match &result {
                Ok(()) => {
                    // Any parked token is older than this one
                    if store.get(PENDING_TOKEN_KEY).is_some() {
                        if let Err(e) = store.remove(PENDING_TOKEN_KEY) {
                            warn!(error = %e, "Failed to clear pending token registration");
                        }
                    }
                    info!(attempt, "Delivery token registered");
                }
                Err(_) if attempt >= last_attempt => {
                    if let Err(e) = store.set(PENDING_TOKEN_KEY, &token) {
                        warn!(error = %e, "Failed to park pending token registration");
                    }
                }
                Err(_) => {}
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::retry::RetryPhase;
    use crate::notification::scheduler::ManualScheduler;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Rejects the first N registrations
    struct FlakyRegistrar {
        failures: u32,
        calls: AtomicU32,
        unregistered: std::sync::Mutex<Vec<String>>,
        unregister_fails: bool,
    }

    impl FlakyRegistrar {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                unregistered: std::sync::Mutex::new(Vec::new()),
                unregister_fails: false,
            }
        }
    }

    impl RemoteRegistrar for FlakyRegistrar {
        fn register(&self, _token: &str) -> Result<(), RegistrationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(RegistrationError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        fn unregister(&self, token: &str) -> Result<(), RegistrationError> {
            self.unregistered.lock().unwrap().push(token.to_string());
            if self.unregister_fails {
                return Err(RegistrationError::Status { status: 503 });
            }
            Ok(())
        }
    }

    fn registrar(
        failures: u32,
    ) -> (TokenRegistrar, Arc<MemoryStore>, Arc<FlakyRegistrar>, Arc<ManualScheduler>) {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FlakyRegistrar::new(failures));
        let scheduler = Arc::new(ManualScheduler::new());
        let registrar = TokenRegistrar::new(
            store.clone(),
            remote.clone(),
            scheduler.clone(),
            RetryPolicy::default(),
        );
        (registrar, store, remote, scheduler)
    }

    #[test]
    fn test_token_persisted_and_registered() {
        let (registrar, store, remote, scheduler) = registrar(0);

        let handle = registrar.on_new_token("tok-1");

        assert_eq!(handle.phase(), RetryPhase::Delivered { attempts: 1 });
        assert_eq!(store.get(TOKEN_KEY), Some("tok-1".to_string()));
        assert_eq!(registrar.current_token(), Some("tok-1".to_string()));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_token_persisted_even_when_remote_fails() {
        let (registrar, store, _remote, scheduler) = registrar(1);

        let handle = registrar.on_new_token("tok-1");
        assert_eq!(store.get(TOKEN_KEY), Some("tok-1".to_string()));
        assert_eq!(handle.phase(), RetryPhase::Pending { attempt: 1 });

        scheduler.run_all();
        assert_eq!(handle.phase(), RetryPhase::Delivered { attempts: 2 });
        assert_eq!(store.get(PENDING_TOKEN_KEY), None);
    }

    #[test]
    fn test_exhausted_registration_is_parked_then_flushed() {
        let (registrar, store, remote, scheduler) = registrar(4);

        let handle = registrar.on_new_token("tok-1");
        scheduler.run_all();

        assert_eq!(handle.phase(), RetryPhase::Exhausted { attempts: 4 });
        assert_eq!(remote.calls.load(Ordering::SeqCst), 4);
        assert_eq!(store.get(PENDING_TOKEN_KEY), Some("tok-1".to_string()));

        let flushed = registrar.flush_pending().expect("pending token");
        assert_eq!(flushed.phase(), RetryPhase::Delivered { attempts: 1 });
        assert_eq!(store.get(PENDING_TOKEN_KEY), None);
        assert!(registrar.flush_pending().is_none());
    }

    #[test]
    fn test_new_token_overwrites_previous() {
        let (registrar, store, _remote, _scheduler) = registrar(0);
        registrar.on_new_token("old");
        registrar.on_new_token("new");
        assert_eq!(store.get(TOKEN_KEY), Some("new".to_string()));
    }

    #[test]
    fn test_newer_token_success_discards_parked_token() {
        let (registrar, store, remote, scheduler) = registrar(4);

        registrar.on_new_token("A");
        scheduler.run_all();
        assert_eq!(store.get(PENDING_TOKEN_KEY), Some("A".to_string()));

        let handle = registrar.on_new_token("B");
        assert_eq!(handle.phase(), RetryPhase::Delivered { attempts: 1 });
        assert_eq!(store.get(PENDING_TOKEN_KEY), None);

        assert!(registrar.flush_pending().is_none());
        assert_eq!(store.get(TOKEN_KEY), Some("B".to_string()));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_flush_drops_pending_token_that_is_not_current() {
        let (registrar, store, remote, _scheduler) = registrar(0);
        store.set(TOKEN_KEY, "B").unwrap();
        store.set(PENDING_TOKEN_KEY, "A").unwrap();

        assert!(registrar.flush_pending().is_none());
        assert_eq!(store.get(TOKEN_KEY), Some("B".to_string()));
        assert_eq!(store.get(PENDING_TOKEN_KEY), None);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unregister_clears_local_token() {
        let (registrar, store, remote, _scheduler) = registrar(0);
        registrar.on_new_token("tok-1");

        assert_eq!(registrar.unregister().unwrap(), Some("tok-1".to_string()));
        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(*remote.unregistered.lock().unwrap(), vec!["tok-1".to_string()]);
        assert_eq!(registrar.unregister().unwrap(), None);
    }

    #[test]
    fn test_unregister_clears_locally_when_backend_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut remote = FlakyRegistrar::new(0);
        remote.unregister_fails = true;
        let registrar = TokenRegistrar::new(
            store.clone(),
            Arc::new(remote),
            Arc::new(ManualScheduler::new()),
            RetryPolicy::default(),
        );
        store.set(TOKEN_KEY, "tok-1").unwrap();

        assert!(matches!(
            registrar.unregister(),
            Err(RegistrationError::Status { status: 503 })
        ));
        assert_eq!(store.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_noop_registrar_always_succeeds() {
        assert!(NoopRegistrar.register("anything").is_ok());
    }
}
