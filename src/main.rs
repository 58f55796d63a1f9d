//! Push Dispatch CLI
//!
//! 推送通知分发引擎的命令行外壳：喂入消息、注册 token、管理偏好

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use push_dispatch::{
    cli::{
        describe_phase, format_output, handle_channels, handle_dispatch, handle_prefs,
        handle_token, DispatchArgs, PrefsCommand, TokenArgs, TokenOutcome,
    },
    DispatchConfig, JsonFileStore,
};

#[derive(Parser)]
#[command(name = "pushd")]
#[command(about = "Push Dispatch - 推送通知分发引擎")]
#[command(version)]
struct Cli {
    /// 配置文件路径 (默认: ~/.config/push-dispatch/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 读取 JSON 行消息并分发
    Dispatch(DispatchArgs),
    /// 注册推送 token
    Token(TokenArgs),
    /// 查看或修改通知偏好
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
    /// 显示内置通知渠道
    Channels {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug pushd dispatch -i messages.jsonl
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("push_dispatch=info,pushd=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config = DispatchConfig::load(cli.config.as_deref())?;
    debug!(store = %config.store_path().display(), "Configuration loaded");

    // 引擎在主线程同步调用，重试任务跑在这个 runtime 上
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Dispatch(args) => {
            let json = args.json;
            let summary = handle_dispatch(args, &config, &runtime)?;
            if json {
                println!("{}", format_output(&summary, true));
            } else {
                eprintln!(
                    "received {} | invalid {} | filtered {} | malformed {} | delivered {} | exhausted {} | unfinished {}",
                    summary.received,
                    summary.invalid,
                    summary.filtered,
                    summary.malformed,
                    summary.delivered,
                    summary.exhausted,
                    summary.unfinished
                );
            }
        }
        Commands::Token(args) => match handle_token(args, &config, &runtime)? {
            TokenOutcome::Registered(phase) => {
                info!(result = %describe_phase(phase), "Token registration finished")
            }
            TokenOutcome::NothingPending => warn!("No pending token registration"),
            TokenOutcome::Unregistered(Some(_)) => info!("Token unregistered"),
            TokenOutcome::Unregistered(None) => warn!("No token stored, nothing to unregister"),
        },
        Commands::Prefs { command } => {
            let store = JsonFileStore::new(config.store_path());
            println!("{}", handle_prefs(command, &store)?);
        }
        Commands::Channels { json } => {
            println!("{}", handle_channels(json));
        }
    }

    Ok(())
}
