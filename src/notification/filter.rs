//! 偏好过滤 - 决定入站消息是否展示

use tracing::debug;

use super::category::NotificationCategory;
use super::message::InboundMessage;
use crate::store::{PreferenceStore, NOTIFICATIONS_ENABLED};

/// 是否放行消息
///
/// 1. 全局开关关闭 -> 拒绝
/// 2. 未知类型 -> 放行（服务端新增类型时不静默丢弃）
/// 3. 否则看该类型的开关，未设置视为开启
///
/// 只读偏好，不写入。
pub fn admit(message: &InboundMessage, prefs: &dyn PreferenceStore) -> bool {
    if !prefs.get_bool(NOTIFICATIONS_ENABLED, true) {
        debug!("Notifications globally disabled");
        return false;
    }

    let category = NotificationCategory::classify(message.category.as_deref());
    let Some(key) = category.preference_key() else {
        return true;
    };

    let enabled = prefs.get_bool(key, true);
    if !enabled {
        debug!(category = %category, preference = key, "Category disabled by preference");
    }
    enabled
}
