//! 配置加载
//!
//! 默认读取 `~/.config/push-dispatch/config.json`，文件不存在时全部使用默认值。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::notification::builder::IdPolicy;
use crate::notification::registration::RegistrationConfig;
use crate::notification::retry::RetryPolicy;
use crate::store::JsonFileStore;

/// 分发配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub retry: RetryPolicy,
    pub id_policy: IdPolicy,
    /// 偏好与 token 存储文件
    pub store_path: Option<PathBuf>,
    /// 后端注册配置，缺省时不上报
    pub registration: Option<RegistrationConfig>,
}

impl DispatchConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("push-dispatch")
            .join("config.json")
    }

    /// 加载配置；`path` 为空时使用默认路径，文件不存在返回默认配置
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(JsonFileStore::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = DispatchConfig::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(config, DispatchConfig::default());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.id_policy, IdPolicy::Coalescing);
        assert!(config.registration.is_none());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "retry": {"max_attempts": 5},
                "id_policy": "unique",
                "store_path": "/tmp/push-store.json",
                "registration": {"endpoint": "https://api.example.com", "auth_token": "secret"}
            }"#,
        )
        .unwrap();

        let config = DispatchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(5000));
        assert_eq!(config.id_policy, IdPolicy::Unique);
        assert_eq!(config.store_path(), PathBuf::from("/tmp/push-store.json"));

        let registration = config.registration.unwrap();
        assert_eq!(registration.endpoint, "https://api.example.com");
        assert_eq!(registration.auth_token.as_deref(), Some("secret"));
        assert_eq!(registration.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = DispatchConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
