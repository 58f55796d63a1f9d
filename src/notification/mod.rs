//! 推送通知分发引擎
//!
//! # 流程
//! 1. 过滤：全局开关 + 分类开关（未知类型放行）
//! 2. 路由：EMERGENCY 走紧急渠道，其余走默认渠道
//! 3. 构建：标题/正文/优先级/振动/点击 payload
//! 4. 投递：展示层失败时固定间隔重试，最多 3 次
//!
//! token 注册是独立流程：本地保存 + 上报后端，同样有界重试。
//!
//! # 使用示例
//! ```ignore
//! use push_dispatch::notification::{InboundMessage, PushService, TokioScheduler};
//! use push_dispatch::store::MemoryStore;
//!
//! let service = PushService::builder()
//!     .store(Arc::new(MemoryStore::new()))
//!     .presenter(presenter)
//!     .scheduler(Arc::new(TokioScheduler::current()?))
//!     .build()?;
//!
//! service.on_create();
//! service.on_message_received(&InboundMessage::new(Some("EMERGENCY"), "Code Blue", "Room 4"));
//! ```

pub mod builder;
pub mod category;
pub mod channel;
pub mod delivery;
pub mod dispatcher;
pub mod filter;
pub mod launch;
pub mod message;
pub mod registration;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod token;

pub use builder::{
    AlertFeedback, ArtifactIdGenerator, IdPolicy, NotificationArtifact, NotificationBuilder,
    PresentationCategory, Priority,
};
pub use category::{classify, NotificationCategory, UrgencyTier};
pub use channel::{builtin_channels, route_channel, Channel, ChannelRouter, Importance, Sound};
pub use delivery::{DeliveryRetrier, Presenter};
pub use dispatcher::{DispatchOutcome, PushDispatcher};
pub use filter::admit;
pub use launch::{ActionHandle, LaunchActions, PayloadLaunchActions};
pub use message::InboundMessage;
pub use registration::{HttpRegistrar, RegistrationConfig};
pub use retry::{RetryHandle, RetryPhase, RetryPolicy, RetryState};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use service::{PushService, PushServiceBuilder};
pub use token::{NoopRegistrar, RemoteRegistrar, TokenRegistrar};
