//! 通知渠道定义与路由
//!
//! 进程生命周期内只有两个固定渠道：紧急渠道和默认渠道。启动时通过声明式列表
//! [`builtin_channels`] 交给展示层 register-if-absent，重复注册不会覆盖用户对渠道的修改。

use serde::{Deserialize, Serialize};

use super::category::{NotificationCategory, UrgencyTier};

pub const EMERGENCY_CHANNEL_ID: &str = "emergency_channel";
pub const DEFAULT_CHANNEL_ID: &str = "default_channel";

/// 紧急振动模式（毫秒：等待、振动、暂停、振动）
pub const EMERGENCY_VIBRATION_PATTERN: [u64; 4] = [0, 500, 200, 500];

/// 渠道重要性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    High,
    Default,
}

/// 提示音
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    /// 平台默认通知音
    PlatformDefault,
}

/// 通知渠道
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// 展示给用户的名称
    pub name: String,
    pub urgency: UrgencyTier,
    pub importance: Importance,
    pub description: String,
    /// 振动模式（毫秒），空表示平台默认
    pub vibration_pattern_ms: Vec<u64>,
    pub sound: Sound,
}

impl Channel {
    pub fn emergency() -> Self {
        Self {
            id: EMERGENCY_CHANNEL_ID.to_string(),
            name: "Emergency Notifications".to_string(),
            urgency: UrgencyTier::Emergency,
            importance: Importance::High,
            description: "Critical notifications that require immediate attention".to_string(),
            vibration_pattern_ms: EMERGENCY_VIBRATION_PATTERN.to_vec(),
            sound: Sound::PlatformDefault,
        }
    }

    pub fn default_channel() -> Self {
        Self {
            id: DEFAULT_CHANNEL_ID.to_string(),
            name: "Default Notifications".to_string(),
            urgency: UrgencyTier::Default,
            importance: Importance::Default,
            description: "Regular app notifications".to_string(),
            vibration_pattern_ms: Vec::new(),
            sound: Sound::PlatformDefault,
        }
    }
}

/// 启动时需要注册的渠道
pub fn builtin_channels() -> Vec<Channel> {
    vec![Channel::emergency(), Channel::default_channel()]
}

/// 渠道路由器 - 持有两个固定渠道
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    emergency: Channel,
    default: Channel,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self {
            emergency: Channel::emergency(),
            default: Channel::default_channel(),
        }
    }

    /// EMERGENCY 走紧急渠道，其余（包括 UNKNOWN）走默认渠道
    pub fn route(&self, category: NotificationCategory) -> &Channel {
        match category.urgency() {
            UrgencyTier::Emergency => &self.emergency,
            UrgencyTier::Default => &self.default,
        }
    }

    pub fn channels(&self) -> [&Channel; 2] {
        [&self.emergency, &self.default]
    }
}

impl Default for ChannelRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// 按类型选择渠道
pub fn route_channel(category: NotificationCategory) -> Channel {
    match category.urgency() {
        UrgencyTier::Emergency => Channel::emergency(),
        UrgencyTier::Default => Channel::default_channel(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_emergency() {
        let router = ChannelRouter::new();
        assert_eq!(router.route(NotificationCategory::Emergency), &Channel::emergency());
        assert_eq!(route_channel(NotificationCategory::Emergency), Channel::emergency());
    }

    #[test]
    fn test_route_everything_else_to_default() {
        let router = ChannelRouter::new();
        let others = NotificationCategory::KNOWN
            .into_iter()
            .filter(|c| *c != NotificationCategory::Emergency)
            .chain([NotificationCategory::Unknown]);

        for category in others {
            assert_eq!(router.route(category).id, DEFAULT_CHANNEL_ID, "{category}");
            assert_eq!(route_channel(category), Channel::default_channel());
        }
    }

    #[test]
    fn test_builtin_channels() {
        let channels = builtin_channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].importance, Importance::High);
        assert_eq!(channels[0].vibration_pattern_ms, vec![0, 500, 200, 500]);
        assert_eq!(channels[1].importance, Importance::Default);
        assert!(channels[1].vibration_pattern_ms.is_empty());
        assert_ne!(channels[0].id, channels[1].id);
    }

    #[test]
    fn test_channel_serialization() {
        let json = serde_json::to_value(Channel::emergency()).unwrap();
        assert_eq!(json["id"], "emergency_channel");
        assert_eq!(json["sound"], "platform_default");
        assert_eq!(json["urgency"], "Emergency");
    }
}
