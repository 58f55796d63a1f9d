//! 后端 token 注册客户端
//!
//! 通过 HTTP 把设备 token 上报给后端 `/api/users/device-token`

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::token::RemoteRegistrar;
use crate::error::RegistrationError;

/// 注册客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// 后端地址（如 https://clinic.example.com）
    pub endpoint: String,
    /// Bearer token（可选）
    pub auth_token: Option<String>,
    /// 平台标识
    pub platform: String,
    /// 超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            auth_token: None,
            platform: std::env::consts::OS.to_string(),
            timeout_secs: 30,
        }
    }
}

/// 设备信息
#[derive(Debug, Serialize)]
pub struct DeviceInfo {
    pub os: String,
}

/// 注册请求载荷
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub token: String,
    pub platform: String,
    pub device_info: DeviceInfo,
}

/// 注销请求载荷
#[derive(Debug, Serialize)]
pub struct UnregisterPayload<'a> {
    pub token: &'a str,
}

/// 注册响应（后端可能返回空 body）
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// HTTP 注册客户端
#[derive(Debug)]
pub struct HttpRegistrar {
    client: Client,
    config: RegistrationConfig,
}

impl HttpRegistrar {
    pub fn new(config: RegistrationConfig) -> Result<Self, RegistrationError> {
        if config.endpoint.is_empty() {
            return Err(RegistrationError::Transport("endpoint is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RegistrationError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn url(&self) -> String {
        format!("{}/api/users/device-token", self.config.endpoint.trim_end_matches('/'))
    }

    fn payload(&self, token: &str) -> RegistrationPayload {
        RegistrationPayload {
            token: token.to_string(),
            platform: self.config.platform.clone(),
            device_info: DeviceInfo {
                os: std::env::consts::OS.to_string(),
            },
        }
    }
}

impl HttpRegistrar {
    fn send(&self, request: RequestBuilder) -> Result<(), RegistrationError> {
        let mut request = request;
        if let Some(auth) = &self.config.auth_token {
            request = request.header("Authorization", format!("Bearer {}", auth));
        }

        let response = request
            .send()
            .map_err(|e| RegistrationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistrationError::Status { status: status.as_u16() });
        }

        let body: RegistrationResponse = response.json().unwrap_or_default();
        if let Some(error) = body.error {
            return Err(RegistrationError::Rejected(error));
        }
        Ok(())
    }
}

impl RemoteRegistrar for HttpRegistrar {
    fn register(&self, token: &str) -> Result<(), RegistrationError> {
        let url = self.url();
        self.send(self.client.post(&url).json(&self.payload(token)))?;
        debug!(url = %url, "Token accepted by backend");
        Ok(())
    }

    fn unregister(&self, token: &str) -> Result<(), RegistrationError> {
        let url = self.url();
        self.send(self.client.delete(&url).json(&UnregisterPayload { token }))?;
        debug!(url = %url, "Token removed from backend");
        Ok(())
    }
}
