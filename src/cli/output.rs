//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::RetryPhase;

/// Format output as pretty JSON or a compact single line
pub fn format_output<T: Serialize>(data: &T, json: bool) -> String {
    if json {
        serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
    } else {
        serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string())
    }
}

/// 重试阶段的简短描述
pub fn describe_phase(phase: RetryPhase) -> String {
    match phase {
        RetryPhase::Pending { attempt } => format!("pending (attempt {})", attempt),
        RetryPhase::Delivered { attempts } => format!("delivered after {} attempt(s)", attempts),
        RetryPhase::Exhausted { attempts } => format!("gave up after {} attempt(s)", attempts),
    }
}
