//! 错误类型
//!
//! 引擎内部的错误从不向宿主进程抛出：畸形消息直接丢弃，瞬时失败走有界重试，
//! 重试耗尽后吞掉。

use thiserror::Error;

/// 消息处理错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// 标题和正文都缺失，没有可展示的内容
    #[error("malformed message: no title and no body")]
    MalformedMessage,
}

/// 展示层错误（展示通知或注册渠道失败）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlingError {
    /// 瞬时失败，可以重试
    #[error("presentation layer failed: {0}")]
    Transient(String),
    /// 渠道已存在（register-if-absent 语义下视为成功）
    #[error("channel already registered: {0}")]
    AlreadyRegistered(String),
}

impl HandlingError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }
}

/// 远程 token 注册错误
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// 本地持久化失败
    #[error("failed to persist token locally: {0}")]
    Persist(String),
    /// 网络传输失败
    #[error("registration request failed: {0}")]
    Transport(String),
    /// 后端返回非 2xx
    #[error("registration endpoint returned HTTP {status}")]
    Status { status: u16 },
    /// 后端明确拒绝
    #[error("registration rejected: {0}")]
    Rejected(String),
}
