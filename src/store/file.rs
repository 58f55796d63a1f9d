//! JSON 文件存储 - 偏好和 token 共用一个 key-value 文件

use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{PreferenceStore, TokenStore};

/// 文件存储，写入时加排他锁并通过临时文件原子替换
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认存储路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("push-dispatch")
            .join("store.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), Value::Bool(value));
        })
    }

    /// 所有条目（按 key 排序）
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        let mut entries: Vec<_> = self.read_map()?.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn lock_file(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_path = self.path.with_extension("lock");
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))
    }

    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid store file {}", self.path.display()))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("store file {} is not a JSON object", self.path.display()),
        }
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        let lock = self.lock_file()?;
        lock.lock_shared()?;
        let result = self.load();
        lock.unlock()?;
        result
    }

    fn update(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let lock = self.lock_file()?;
        lock.lock_exclusive()?;

        let result = (|| {
            let mut map = self.load()?;
            f(&mut map);

            let temp_path = self.path.with_extension("tmp");
            fs::write(&temp_path, serde_json::to_string_pretty(&Value::Object(map))?)?;
            fs::rename(&temp_path, &self.path)?;
            Ok(())
        })();

        lock.unlock()?;
        result
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.read_map() {
            Ok(map) => map.get(key).and_then(Value::as_bool).unwrap_or(default),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read preferences, using default");
                default
            }
        }
    }
}

impl TokenStore for JsonFileStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn get(&self, key: &str) -> Option<String> {
        self.read_map()
            .ok()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NOTIFICATIONS_ENABLED, TOKEN_KEY};
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert!(store.get_bool(NOTIFICATIONS_ENABLED, true));
        assert_eq!(store.get(TOKEN_KEY), None);
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_prefs_and_token_persist() {
        let (_dir, store) = temp_store();
        store.set_bool("messages_enabled", false).unwrap();
        store.set(TOKEN_KEY, "abc").unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert!(!reopened.get_bool("messages_enabled", true));
        assert_eq!(reopened.get(TOKEN_KEY), Some("abc".to_string()));

        reopened.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "not json").unwrap();
        assert!(store.get_bool(NOTIFICATIONS_ENABLED, true));
        assert!(store.set(TOKEN_KEY, "abc").is_err());
    }
}
