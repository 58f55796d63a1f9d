//! 推送服务 - 宿主应用的入口
//!
//! 把分发器和 token 注册器组装在一起，对应宿主的三个生命周期事件：
//! 启动（注册渠道）、收到消息、收到新 token。

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;

use super::builder::{ArtifactIdGenerator, IdPolicy, NotificationBuilder};
use super::delivery::{DeliveryRetrier, Presenter};
use super::dispatcher::{DispatchOutcome, PushDispatcher};
use super::launch::{LaunchActions, PayloadLaunchActions};
use super::message::InboundMessage;
use super::registration::HttpRegistrar;
use super::retry::{RetryHandle, RetryPolicy};
use super::scheduler::Scheduler;
use super::token::{NoopRegistrar, RemoteRegistrar, TokenRegistrar};
use crate::config::DispatchConfig;
use crate::error::RegistrationError;
use crate::store::{PreferenceStore, TokenStore};

/// 推送服务
pub struct PushService {
    dispatcher: PushDispatcher,
    tokens: TokenRegistrar,
}

impl PushService {
    pub fn builder() -> PushServiceBuilder {
        PushServiceBuilder::new()
    }

    /// 启动时调用：注册两个固定渠道
    pub fn on_create(&self) -> Vec<RetryHandle> {
        self.dispatcher.register_channels()
    }

    pub fn on_message_received(&self, message: &InboundMessage) -> DispatchOutcome {
        self.dispatcher.on_message_received(message)
    }

    pub fn on_new_token(&self, token: &str) -> RetryHandle {
        self.tokens.on_new_token(token)
    }

    /// 补发之前注册失败的 token
    pub fn flush_pending_token(&self) -> Option<RetryHandle> {
        self.tokens.flush_pending()
    }

    /// 注销当前 token（例如用户登出）
    pub fn unregister_token(&self) -> Result<Option<String>, RegistrationError> {
        self.tokens.unregister()
    }

    pub fn dispatcher(&self) -> &PushDispatcher {
        &self.dispatcher
    }

    pub fn tokens(&self) -> &TokenRegistrar {
        &self.tokens
    }
}

/// 推送服务构建器
pub struct PushServiceBuilder {
    prefs: Option<Arc<dyn PreferenceStore>>,
    token_store: Option<Arc<dyn TokenStore>>,
    presenter: Option<Arc<dyn Presenter>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    launcher: Arc<dyn LaunchActions>,
    registrar: Arc<dyn RemoteRegistrar>,
    retry: RetryPolicy,
    id_policy: IdPolicy,
}

impl PushServiceBuilder {
    pub fn new() -> Self {
        Self {
            prefs: None,
            token_store: None,
            presenter: None,
            scheduler: None,
            launcher: Arc::new(PayloadLaunchActions),
            registrar: Arc::new(NoopRegistrar),
            retry: RetryPolicy::default(),
            id_policy: IdPolicy::default(),
        }
    }

    /// 偏好和 token 使用同一个存储
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: PreferenceStore + TokenStore + 'static,
    {
        let prefs: Arc<dyn PreferenceStore> = store.clone();
        let token_store: Arc<dyn TokenStore> = store;
        self.prefs = Some(prefs);
        self.token_store = Some(token_store);
        self
    }

    pub fn preferences(mut self, prefs: Arc<dyn PreferenceStore>) -> Self {
        self.prefs = Some(prefs);
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn LaunchActions>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn registrar(mut self, registrar: Arc<dyn RemoteRegistrar>) -> Self {
        self.registrar = registrar;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    /// 应用配置文件中的重试、id 策略和后端注册设置
    pub fn config(mut self, config: &DispatchConfig) -> Result<Self> {
        self.retry = config.retry;
        self.id_policy = config.id_policy;
        if let Some(registration) = &config.registration {
            info!(endpoint = %registration.endpoint, "Using HTTP token registration");
            self.registrar = Arc::new(HttpRegistrar::new(registration.clone())?);
        }
        Ok(self)
    }

    pub fn build(self) -> Result<PushService> {
        let prefs = self.prefs.ok_or_else(|| anyhow!("preference store is required"))?;
        let token_store = self.token_store.ok_or_else(|| anyhow!("token store is required"))?;
        let presenter = self.presenter.ok_or_else(|| anyhow!("presenter is required"))?;
        let scheduler = self.scheduler.ok_or_else(|| anyhow!("scheduler is required"))?;

        let builder = NotificationBuilder::new(ArtifactIdGenerator::new(self.id_policy), self.launcher);
        let delivery = DeliveryRetrier::new(presenter, Arc::clone(&scheduler), self.retry);
        let dispatcher = PushDispatcher::new(prefs, builder, delivery);
        let tokens = TokenRegistrar::new(token_store, self.registrar, scheduler, self.retry);

        Ok(PushService { dispatcher, tokens })
    }
}

impl Default for PushServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlingError;
    use crate::notification::builder::NotificationArtifact;
    use crate::notification::channel::Channel;
    use crate::notification::registration::RegistrationConfig;
    use crate::notification::retry::RetryPhase;
    use crate::notification::scheduler::ManualScheduler;
    use crate::store::{MemoryStore, TOKEN_KEY};

    struct AcceptingPresenter;

    impl Presenter for AcceptingPresenter {
        fn register_channel(&self, _channel: &Channel) -> Result<(), HandlingError> {
            Ok(())
        }

        fn present(&self, _artifact: &NotificationArtifact) -> Result<(), HandlingError> {
            Ok(())
        }
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let err = PushService::builder().build().err().unwrap();
        assert!(err.to_string().contains("preference store"));

        let err = PushService::builder()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("presenter"));
    }

    #[test]
    fn test_service_lifecycle() {
        let store = Arc::new(MemoryStore::new());
        let service = PushService::builder()
            .store(store.clone())
            .presenter(Arc::new(AcceptingPresenter))
            .scheduler(Arc::new(ManualScheduler::new()))
            .build()
            .unwrap();

        assert!(service
            .on_create()
            .iter()
            .all(|h| h.phase() == RetryPhase::Delivered { attempts: 1 }));
        assert!(service
            .on_message_received(&InboundMessage::new(Some("MESSAGE"), "t", "b"))
            .is_dispatched());
        assert_eq!(service.on_new_token("tok").phase(), RetryPhase::Delivered { attempts: 1 });
        assert_eq!(store.get(TOKEN_KEY), Some("tok".to_string()));
        assert!(service.flush_pending_token().is_none());

        assert_eq!(service.unregister_token().unwrap(), Some("tok".to_string()));
        assert_eq!(store.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_config_applies_policies() {
        let config = DispatchConfig {
            retry: RetryPolicy { max_attempts: 1, ..Default::default() },
            id_policy: IdPolicy::Unique,
            registration: Some(RegistrationConfig {
                endpoint: "http://localhost:3000".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let builder = PushService::builder().config(&config).unwrap();
        assert_eq!(builder.retry.max_attempts, 1);
        assert_eq!(builder.id_policy, IdPolicy::Unique);
    }

    #[test]
    fn test_config_rejects_empty_endpoint() {
        let config = DispatchConfig {
            registration: Some(RegistrationConfig::default()),
            ..Default::default()
        };
        assert!(PushService::builder().config(&config).is_err());
    }
}
