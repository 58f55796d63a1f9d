//! 通知构建器 - 从入站消息和渠道组装可展示的通知
//!
//! 通知 id 由构建时的毫秒时间戳生成。同一毫秒内的多条消息在
//! [`IdPolicy::Coalescing`] 下会得到相同 id，展示层会用后一条替换前一条；
//! 需要全部展示时使用 [`IdPolicy::Unique`]。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::category::UrgencyTier;
use super::channel::{Channel, EMERGENCY_VIBRATION_PATTERN};
use super::launch::{ActionHandle, LaunchActions};
use super::message::InboundMessage;
use crate::error::DispatchError;
use crate::store::{PreferenceStore, SOUND_ENABLED, VIBRATION_ENABLED};

/// 展示优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Default,
}

/// 展示类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationCategory {
    Alarm,
}

/// 构建完成、可直接展示的通知
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationArtifact {
    /// 展示层去重用的 id（弱唯一）
    pub id: i64,
    pub channel_id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub priority: Priority,
    /// 点击后自动消失
    pub auto_cancel: bool,
    pub sound: bool,
    pub vibrate: bool,
    /// 紧急通知为 Alarm
    pub category: Option<PresentationCategory>,
    /// 紧急通知强制使用的振动模式，覆盖渠道设置
    pub vibration_override_ms: Option<Vec<u64>>,
    /// 消息全部字段，点击后用于还原上下文
    pub tap_payload: HashMap<String, String>,
    pub tap_action: ActionHandle,
}

/// 通知 id 策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// 毫秒时间戳，同一毫秒内的通知相互替换
    #[default]
    Coalescing,
    /// 基于时间且严格递增
    Unique,
}

/// 通知 id 生成器
#[derive(Debug)]
pub struct ArtifactIdGenerator {
    policy: IdPolicy,
    clock: fn() -> i64,
    last: AtomicI64,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ArtifactIdGenerator {
    pub fn new(policy: IdPolicy) -> Self {
        Self::with_clock(policy, now_millis)
    }

    /// 使用自定义时钟（测试用）
    pub fn with_clock(policy: IdPolicy, clock: fn() -> i64) -> Self {
        Self {
            policy,
            clock,
            last: AtomicI64::new(i64::MIN),
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    pub fn next_id(&self) -> i64 {
        let now = (self.clock)();
        match self.policy {
            IdPolicy::Coalescing => now,
            IdPolicy::Unique => {
                let advance = |last: i64| now.max(last.saturating_add(1));
                let previous = self
                    .last
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(advance(last)))
                    .unwrap_or_else(|last| last);
                advance(previous)
            }
        }
    }
}

/// 声音/振动开关（只作用于非紧急通知）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertFeedback {
    pub sound: bool,
    pub vibrate: bool,
}

impl Default for AlertFeedback {
    fn default() -> Self {
        Self {
            sound: true,
            vibrate: true,
        }
    }
}

impl AlertFeedback {
    pub fn from_prefs(prefs: &dyn PreferenceStore) -> Self {
        Self {
            sound: prefs.get_bool(SOUND_ENABLED, true),
            vibrate: prefs.get_bool(VIBRATION_ENABLED, true),
        }
    }
}

/// 通知构建器
pub struct NotificationBuilder {
    ids: ArtifactIdGenerator,
    launcher: Arc<dyn LaunchActions>,
}

impl NotificationBuilder {
    pub fn new(ids: ArtifactIdGenerator, launcher: Arc<dyn LaunchActions>) -> Self {
        Self { ids, launcher }
    }

    pub fn id_policy(&self) -> IdPolicy {
        self.ids.policy()
    }

    /// 使用默认声音/振动设置构建
    pub fn build(
        &self,
        message: &InboundMessage,
        channel: &Channel,
        urgency: UrgencyTier,
    ) -> Result<NotificationArtifact, DispatchError> {
        self.build_with_feedback(message, channel, urgency, AlertFeedback::default())
    }

    /// 构建通知；标题和正文都缺失时返回 `MalformedMessage`
    pub fn build_with_feedback(
        &self,
        message: &InboundMessage,
        channel: &Channel,
        urgency: UrgencyTier,
        feedback: AlertFeedback,
    ) -> Result<NotificationArtifact, DispatchError> {
        if !message.is_displayable() {
            return Err(DispatchError::MalformedMessage);
        }

        let emergency = urgency == UrgencyTier::Emergency;

        Ok(NotificationArtifact {
            id: self.ids.next_id(),
            channel_id: channel.id.clone(),
            title: message.title.clone(),
            body: message.body.clone(),
            priority: if emergency { Priority::High } else { Priority::Default },
            auto_cancel: true,
            sound: emergency || feedback.sound,
            vibrate: emergency || feedback.vibrate,
            category: emergency.then_some(PresentationCategory::Alarm),
            vibration_override_ms: emergency.then(|| EMERGENCY_VIBRATION_PATTERN.to_vec()),
            tap_payload: message.attributes.clone(),
            tap_action: self.launcher.build_launch_action(&message.attributes),
        })
    }
}
