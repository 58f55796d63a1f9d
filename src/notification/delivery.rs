//! 通知投递 - 把构建好的通知交给展示层，失败时有界重试

use std::sync::Arc;
use tracing::{debug, info};

use super::builder::NotificationArtifact;
use super::channel::Channel;
use super::retry::{self, RetryHandle, RetryPolicy};
use super::scheduler::Scheduler;
use crate::error::HandlingError;

/// 展示层（宿主实现）
pub trait Presenter: Send + Sync {
    /// 注册渠道，已存在时不得覆盖用户修改过的设置
    fn register_channel(&self, channel: &Channel) -> Result<(), HandlingError>;

    /// 展示通知；相同 id 的通知会替换已展示的那条
    fn present(&self, artifact: &NotificationArtifact) -> Result<(), HandlingError>;
}

/// 投递重试器
#[derive(Clone)]
pub struct DeliveryRetrier {
    presenter: Arc<dyn Presenter>,
    scheduler: Arc<dyn Scheduler>,
    policy: RetryPolicy,
}

impl DeliveryRetrier {
    pub fn new(presenter: Arc<dyn Presenter>, scheduler: Arc<dyn Scheduler>, policy: RetryPolicy) -> Self {
        Self {
            presenter,
            scheduler,
            policy,
        }
    }

    /// 投递通知，立即返回；重试在调度器上进行
    pub fn deliver(&self, artifact: NotificationArtifact) -> RetryHandle {
        let presenter = Arc::clone(&self.presenter);
        retry::start("present", self.policy, Arc::clone(&self.scheduler), move |attempt| {
            presenter.present(&artifact)?;
            info!(
                id = artifact.id,
                channel = %artifact.channel_id,
                attempt,
                "Notification presented"
            );
            Ok::<(), HandlingError>(())
        })
    }

    /// 注册渠道（register-if-absent），已存在视为成功
    pub fn register_channel(&self, channel: Channel) -> RetryHandle {
        let presenter = Arc::clone(&self.presenter);
        retry::start("register_channel", self.policy, Arc::clone(&self.scheduler), move |_attempt| {
            match presenter.register_channel(&channel) {
                Ok(()) => {
                    info!(channel = %channel.id, "Registered notification channel");
                    Ok(())
                }
                Err(HandlingError::AlreadyRegistered(_)) => {
                    debug!(channel = %channel.id, "Channel already registered, keeping existing settings");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        })
    }
}
