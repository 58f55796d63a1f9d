//! 控制台展示层 - 把通知以 JSON 行输出到 stdout

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::error::HandlingError;
use crate::notification::{Channel, NotificationArtifact, Presenter};

/// 控制台展示层，可模拟前 N 次展示失败
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    channels: Mutex<HashSet<String>>,
    fail_remaining: AtomicU32,
    presented: AtomicU32,
    quiet: bool,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前 `n` 次 present 返回瞬时错误
    pub fn failing_first(mut self, n: u32) -> Self {
        self.fail_remaining = AtomicU32::new(n);
        self
    }

    /// 不输出到 stdout
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn presented_count(&self) -> u32 {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn channel_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self
            .channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

impl Presenter for ConsolePresenter {
    fn register_channel(&self, channel: &Channel) -> Result<(), HandlingError> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if !channels.insert(channel.id.clone()) {
            return Err(HandlingError::AlreadyRegistered(channel.id.clone()));
        }
        debug!(channel = %channel.id, "Console channel created");
        Ok(())
    }

    fn present(&self, artifact: &NotificationArtifact) -> Result<(), HandlingError> {
        let failed = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(HandlingError::transient("simulated presentation failure"));
        }

        if !self.quiet {
            let line = serde_json::to_string(artifact)
                .map_err(|e| HandlingError::transient(e.to_string()))?;
            println!("{}", line);
        }
        self.presented.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
