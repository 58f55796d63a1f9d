//! `pushd channels` - 显示内置通知渠道

use crate::notification::{builtin_channels, Channel};

/// Handle the `channels` subcommand
pub fn handle_channels(json: bool) -> String {
    let channels = builtin_channels();
    if json {
        return super::format_output(&channels, true);
    }
    channels.iter().map(describe).collect::<Vec<_>>().join("\n")
}

fn describe(channel: &Channel) -> String {
    format!(
        "{:<18} {:<10} {:?} vibration={:?}",
        channel.id, channel.urgency, channel.importance, channel.vibration_pattern_ms
    )
}
