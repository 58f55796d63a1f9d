//! Push Dispatch - 推送通知分发引擎

pub mod cli;
pub mod config;
pub mod error;
pub mod notification;
pub mod store;

pub use config::DispatchConfig;
pub use error::{DispatchError, HandlingError, RegistrationError};
pub use notification::{
    admit, classify, route_channel, Channel, DispatchOutcome, InboundMessage, NotificationArtifact,
    NotificationCategory, PushService, RetryHandle, RetryPhase, UrgencyTier,
};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, TokenStore};
