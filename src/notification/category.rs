//! Category classification for inbound push messages
//!
//! The declared type string of a message maps onto a fixed vocabulary.
//! The category decides which preference gates the message and which
//! urgency tier it is routed through:
//! - EMERGENCY: emergency channel, high priority, forced vibration
//! - everything else: default channel

use serde::{Deserialize, Serialize};

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    OperationNote,
    Message,
    PatientUpdate,
    Mention,
    Reaction,
    Emergency,
    Unknown,
}

/// Urgency tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrgencyTier {
    Emergency,
    Default,
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyTier::Emergency => write!(f, "EMERGENCY"),
            UrgencyTier::Default => write!(f, "DEFAULT"),
        }
    }
}

impl NotificationCategory {
    /// All recognised categories (UNKNOWN excluded)
    pub const KNOWN: [NotificationCategory; 6] = [
        NotificationCategory::OperationNote,
        NotificationCategory::Message,
        NotificationCategory::PatientUpdate,
        NotificationCategory::Mention,
        NotificationCategory::Reaction,
        NotificationCategory::Emergency,
    ];

    /// Classify a declared type string.
    ///
    /// Total over every input: absent or unrecognised values are UNKNOWN.
    /// Matching is exact and case-sensitive, `"message"` is UNKNOWN.
    pub fn classify(category: Option<&str>) -> Self {
        match category {
            Some("OPERATION_NOTE") => NotificationCategory::OperationNote,
            Some("MESSAGE") => NotificationCategory::Message,
            Some("PATIENT_UPDATE") => NotificationCategory::PatientUpdate,
            Some("MENTION") => NotificationCategory::Mention,
            Some("REACTION") => NotificationCategory::Reaction,
            Some("EMERGENCY") => NotificationCategory::Emergency,
            _ => NotificationCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::OperationNote => "OPERATION_NOTE",
            NotificationCategory::Message => "MESSAGE",
            NotificationCategory::PatientUpdate => "PATIENT_UPDATE",
            NotificationCategory::Mention => "MENTION",
            NotificationCategory::Reaction => "REACTION",
            NotificationCategory::Emergency => "EMERGENCY",
            NotificationCategory::Unknown => "UNKNOWN",
        }
    }

    /// Preference key gating this category. UNKNOWN has none.
    pub fn preference_key(&self) -> Option<&'static str> {
        match self {
            NotificationCategory::OperationNote => Some("operation_notes_enabled"),
            NotificationCategory::Message => Some("messages_enabled"),
            NotificationCategory::PatientUpdate => Some("patient_updates_enabled"),
            NotificationCategory::Mention => Some("mentions_enabled"),
            NotificationCategory::Reaction => Some("reactions_enabled"),
            NotificationCategory::Emergency => Some("emergency_alerts_enabled"),
            NotificationCategory::Unknown => None,
        }
    }

    pub fn urgency(&self) -> UrgencyTier {
        if *self == NotificationCategory::Emergency {
            UrgencyTier::Emergency
        } else {
            UrgencyTier::Default
        }
    }
}

/// Convenience wrapper over [`NotificationCategory::classify`]
pub fn classify(category: Option<&str>) -> NotificationCategory {
    NotificationCategory::classify(category)
}
