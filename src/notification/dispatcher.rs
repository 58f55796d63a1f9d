//! 推送分发器 - 过滤、路由、构建、投递
//!
//! 入站消息 -> 偏好过滤 -> 渠道路由 -> 通知构建 -> 投递重试。
//! 每条消息独立处理，不做去重，也不保证顺序。

use std::sync::Arc;
use tracing::{debug, warn};

use super::builder::{AlertFeedback, NotificationBuilder};
use super::category::NotificationCategory;
use super::channel::{builtin_channels, ChannelRouter};
use super::delivery::DeliveryRetrier;
use super::filter::admit;
use super::message::InboundMessage;
use super::retry::RetryHandle;
use crate::store::PreferenceStore;

/// 单条消息的处理结果
#[derive(Debug)]
pub enum DispatchOutcome {
    /// 被偏好过滤，未构建通知
    Filtered,
    /// 没有可展示内容，已丢弃
    Malformed,
    /// 已交给投递重试器
    Dispatched {
        artifact_id: i64,
        channel_id: String,
        handle: RetryHandle,
    },
}

impl DispatchOutcome {
    pub fn handle(&self) -> Option<&RetryHandle> {
        match self {
            DispatchOutcome::Dispatched { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched { .. })
    }
}

/// 推送分发器
pub struct PushDispatcher {
    prefs: Arc<dyn PreferenceStore>,
    router: ChannelRouter,
    builder: NotificationBuilder,
    delivery: DeliveryRetrier,
}

impl PushDispatcher {
    pub fn new(
        prefs: Arc<dyn PreferenceStore>,
        builder: NotificationBuilder,
        delivery: DeliveryRetrier,
    ) -> Self {
        Self {
            prefs,
            router: ChannelRouter::new(),
            builder,
            delivery,
        }
    }

    pub fn router(&self) -> &ChannelRouter {
        &self.router
    }

    /// 注册两个固定渠道（幂等）
    pub fn register_channels(&self) -> Vec<RetryHandle> {
        builtin_channels()
            .into_iter()
            .map(|channel| self.delivery.register_channel(channel))
            .collect()
    }

    /// 处理入站消息
    pub fn on_message_received(&self, message: &InboundMessage) -> DispatchOutcome {
        if !admit(message, self.prefs.as_ref()) {
            debug!(category = ?message.category, "Message filtered by preferences");
            return DispatchOutcome::Filtered;
        }

        let category = NotificationCategory::classify(message.category.as_deref());
        let urgency = category.urgency();
        let channel = self.router.route(category);
        debug!(category = %category, channel = %channel.id, "Routed message");

        let feedback = AlertFeedback::from_prefs(self.prefs.as_ref());
        let artifact = match self.builder.build_with_feedback(message, channel, urgency, feedback) {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!(category = %category, error = %e, "Discarding message");
                return DispatchOutcome::Malformed;
            }
        };

        let artifact_id = artifact.id;
        let channel_id = artifact.channel_id.clone();
        let handle = self.delivery.deliver(artifact);

        DispatchOutcome::Dispatched {
            artifact_id,
            channel_id,
            handle,
        }
    }
}
