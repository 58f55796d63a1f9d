//! 点击动作 - 由宿主应用把 payload 转换成启动动作

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 不透明的启动动作句柄，引擎只负责传递
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHandle(pub String);

/// 启动动作构建（宿主实现）
pub trait LaunchActions: Send + Sync {
    fn build_launch_action(&self, payload: &HashMap<String, String>) -> ActionHandle;
}

/// 把 payload 序列化为 JSON 作为句柄（无宿主时使用）
#[derive(Debug, Clone, Default)]
pub struct PayloadLaunchActions;

impl LaunchActions for PayloadLaunchActions {
    fn build_launch_action(&self, payload: &HashMap<String, String>) -> ActionHandle {
        // 排序后序列化，同一 payload 得到同一句柄
        let sorted: BTreeMap<_, _> = payload.iter().collect();
        ActionHandle(serde_json::to_string(&sorted).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_handle_is_stable() {
        let mut payload = HashMap::new();
        payload.insert("patientId".to_string(), "p-9".to_string());
        payload.insert("type".to_string(), "PATIENT_UPDATE".to_string());

        let launcher = PayloadLaunchActions;
        let handle = launcher.build_launch_action(&payload);
        assert_eq!(handle, launcher.build_launch_action(&payload.clone()));
        assert_eq!(handle.0, r#"{"patientId":"p-9","type":"PATIENT_UPDATE"}"#);
    }

    #[test]
    fn test_empty_payload() {
        let handle = PayloadLaunchActions.build_launch_action(&HashMap::new());
        assert_eq!(handle.0, "{}");
    }
}
