//! `pushd token` - 注册新 token、补发挂起的 token 或注销

use anyhow::{bail, Result};
use clap::Args;
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::console::ConsolePresenter;
use super::dispatch::wait_all;
use crate::config::DispatchConfig;
use crate::notification::{PushService, RetryPhase, TokioScheduler};
use crate::store::JsonFileStore;

/// Arguments for the `token` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct TokenArgs {
    /// 新的推送 token
    #[arg(conflicts_with_all = ["flush", "unregister"])]
    pub token: Option<String>,

    /// 重新注册之前失败的 token
    #[arg(long, conflicts_with = "unregister")]
    pub flush: bool,

    /// 注销当前 token
    #[arg(long)]
    pub unregister: bool,
}

/// `token` 子命令的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    /// 注册流程结束
    Registered(RetryPhase),
    /// 没有需要补发的 token
    NothingPending,
    /// 已注销（`None` 表示本地没有 token）
    Unregistered(Option<String>),
}

/// Handle the `token` subcommand
pub fn handle_token(args: TokenArgs, config: &DispatchConfig, runtime: &Runtime) -> Result<TokenOutcome> {
    let service = PushService::builder()
        .config(config)?
        .store(Arc::new(JsonFileStore::new(config.store_path())))
        .presenter(Arc::new(ConsolePresenter::new()))
        .scheduler(Arc::new(TokioScheduler::new(runtime.handle().clone())))
        .build()?;

    if args.unregister {
        return Ok(TokenOutcome::Unregistered(service.unregister_token()?));
    }

    let handle = match (args.token, args.flush) {
        (Some(token), _) => service.on_new_token(&token),
        (None, true) => match service.flush_pending_token() {
            Some(handle) => handle,
            None => return Ok(TokenOutcome::NothingPending),
        },
        (None, false) => bail!("a token, --flush or --unregister is required"),
    };

    let phase = wait_all(runtime, vec![handle])
        .into_iter()
        .next()
        .unwrap_or(RetryPhase::Pending { attempt: 0 });
    Ok(TokenOutcome::Registered(phase))
}
