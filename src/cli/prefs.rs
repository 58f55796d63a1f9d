//! `pushd prefs` - 查看和修改通知偏好

use anyhow::{bail, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::notification::NotificationCategory;
use crate::store::{
    JsonFileStore, PreferenceStore, NOTIFICATIONS_ENABLED, SOUND_ENABLED, VIBRATION_ENABLED,
};

#[derive(Subcommand, Debug, Clone)]
pub enum PrefsCommand {
    /// 列出所有偏好的生效值
    List {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 设置布尔偏好
    Set {
        /// 偏好 key，例如 messages_enabled
        key: String,
        /// true / false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

/// 一条偏好及其生效值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceEntry {
    pub key: String,
    pub enabled: bool,
    /// 是否显式设置过（否则为默认值）
    pub explicit: bool,
}

/// 引擎读取的全部偏好 key
pub fn known_preference_keys() -> Vec<&'static str> {
    let mut keys = vec![NOTIFICATIONS_ENABLED];
    keys.extend(
        NotificationCategory::KNOWN
            .iter()
            .filter_map(|c| c.preference_key()),
    );
    keys.push(SOUND_ENABLED);
    keys.push(VIBRATION_ENABLED);
    keys
}

pub fn list_preferences(store: &JsonFileStore) -> Result<Vec<PreferenceEntry>> {
    let entries = store.entries()?;
    Ok(known_preference_keys()
        .into_iter()
        .map(|key| PreferenceEntry {
            key: key.to_string(),
            enabled: store.get_bool(key, true),
            explicit: entries.iter().any(|(k, v)| k == key && v.is_boolean()),
        })
        .collect())
}

/// Handle the `prefs` subcommand
pub fn handle_prefs(command: PrefsCommand, store: &JsonFileStore) -> Result<String> {
    match command {
        PrefsCommand::List { json } => {
            let entries = list_preferences(store)?;
            if json {
                return Ok(super::format_output(&entries, true));
            }
            Ok(entries
                .iter()
                .map(|e| {
                    let marker = if e.explicit { "" } else { " (default)" };
                    format!("{:<26} {}{}", e.key, e.enabled, marker)
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        PrefsCommand::Set { key, value } => {
            if !known_preference_keys().contains(&key.as_str()) {
                bail!("unknown preference key: {}", key);
            }
            store.set_bool(&key, value)?;
            Ok(format!("{} = {}", key, value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_keys_cover_every_category() {
        let keys = known_preference_keys();
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&"emergency_alerts_enabled"));
        assert!(keys.contains(&"patient_updates_enabled"));
    }

    #[test]
    fn test_set_then_list() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        handle_prefs(
            PrefsCommand::Set {
                key: "messages_enabled".to_string(),
                value: false,
            },
            &store,
        )
        .unwrap();

        let entries = list_preferences(&store).unwrap();
        let messages = entries.iter().find(|e| e.key == "messages_enabled").unwrap();
        assert!(!messages.enabled);
        assert!(messages.explicit);

        let global = entries.iter().find(|e| e.key == NOTIFICATIONS_ENABLED).unwrap();
        assert!(global.enabled);
        assert!(!global.explicit);
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        let result = handle_prefs(
            PrefsCommand::Set {
                key: "bogus".to_string(),
                value: true,
            },
            &store,
        );
        assert!(result.is_err());
    }
}
