//! 偏好与 token 存储接口
//!
//! 引擎不访问任何进程级全局状态，偏好和 token 都通过这里的 trait 注入。

pub mod file;

use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

pub use file::JsonFileStore;

/// 全局开关
pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
/// 非紧急通知是否播放声音
pub const SOUND_ENABLED: &str = "sound_enabled";
/// 非紧急通知是否振动
pub const VIBRATION_ENABLED: &str = "vibration_enabled";
/// 当前推送 token
pub const TOKEN_KEY: &str = "fcm_token";
/// 注册失败、等待补发的 token
pub const PENDING_TOKEN_KEY: &str = "pending_token_registration";

/// 偏好存储（对引擎只读，由设置界面在外部修改）
pub trait PreferenceStore: Send + Sync {
    /// 读取布尔偏好，未设置或类型不符时返回 `default`
    fn get_bool(&self, key: &str, default: bool) -> bool;
}

/// token 存储（单 key，后写覆盖）
pub trait TokenStore: Send + Sync {
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// 内存实现，测试和一次性运行使用
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定偏好初始化
    pub fn with_prefs<'a>(prefs: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let store = Self::new();
        for (key, value) in prefs {
            store.set_bool(key, value);
        }
        store
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), Value::Bool(value));
    }
}

impl PreferenceStore for MemoryStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

impl TokenStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}
