//! `pushd dispatch` - 从 JSON 行读取消息并走完整分发流程

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::console::ConsolePresenter;
use super::output::describe_phase;
use crate::config::DispatchConfig;
use crate::notification::{
    DispatchOutcome, InboundMessage, PushService, RetryHandle, RetryPhase, TokioScheduler,
};
use crate::store::JsonFileStore;

/// Arguments for the `dispatch` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct DispatchArgs {
    /// 输入文件（每行一个 JSON 消息），缺省读取 stdin
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// 模拟展示层前 N 次失败
    #[arg(long, default_value = "0")]
    pub fail_first: u32,

    /// 覆盖重试间隔（毫秒）
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// 输出 JSON 格式的汇总
    #[arg(long)]
    pub json: bool,
}

/// 一次 dispatch 运行的汇总
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub received: usize,
    pub invalid: usize,
    pub filtered: usize,
    pub malformed: usize,
    pub delivered: usize,
    pub exhausted: usize,
    /// 运行结束时仍未完成的重试序列
    pub unfinished: usize,
}

impl DispatchSummary {
    fn record(&mut self, phase: RetryPhase) {
        match phase {
            RetryPhase::Delivered { .. } => self.delivered += 1,
            RetryPhase::Exhausted { .. } => self.exhausted += 1,
            RetryPhase::Pending { .. } => self.unfinished += 1,
        }
    }
}

/// 解析 JSON 行输入，空行跳过；返回合法消息和无法解析的行数
pub fn read_messages(reader: impl BufRead) -> Result<(Vec<InboundMessage>, usize)> {
    let mut messages = Vec::new();
    let mut invalid = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundMessage>(line) {
            Ok(message) => messages.push(message),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping invalid message");
                invalid += 1;
            }
        }
    }

    Ok((messages, invalid))
}

/// 在给定 runtime 上等待所有重试序列结束
pub fn wait_all(runtime: &Runtime, handles: Vec<RetryHandle>) -> Vec<RetryPhase> {
    runtime.block_on(async move {
        let mut phases = Vec::with_capacity(handles.len());
        for handle in handles {
            phases.push(handle.wait().await);
        }
        phases
    })
}

/// Handle the `dispatch` subcommand
pub fn handle_dispatch(
    args: DispatchArgs,
    config: &DispatchConfig,
    runtime: &Runtime,
) -> Result<DispatchSummary> {
    let (messages, invalid) = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_messages(BufReader::new(file))?
        }
        None => read_messages(io::stdin().lock())?,
    };

    let mut config = config.clone();
    if let Some(ms) = args.delay_ms {
        config.retry.delay = Duration::from_millis(ms);
    }

    let store = Arc::new(JsonFileStore::new(config.store_path()));
    let presenter = Arc::new(ConsolePresenter::new().failing_first(args.fail_first));
    let service = PushService::builder()
        .config(&config)?
        .store(store)
        .presenter(presenter)
        .scheduler(Arc::new(TokioScheduler::new(runtime.handle().clone())))
        .build()?;

    wait_all(runtime, service.on_create());

    let mut summary = DispatchSummary {
        received: messages.len(),
        invalid,
        ..Default::default()
    };
    let mut handles = Vec::new();

    for message in &messages {
        match service.on_message_received(message) {
            DispatchOutcome::Filtered => summary.filtered += 1,
            DispatchOutcome::Malformed => summary.malformed += 1,
            DispatchOutcome::Dispatched { handle, .. } => handles.push(handle),
        }
    }

    for phase in wait_all(runtime, handles) {
        info!(result = %describe_phase(phase), "Delivery finished");
        summary.record(phase);
    }

    Ok(summary)
}
