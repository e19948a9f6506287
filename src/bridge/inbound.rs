//! Routing of chat lines into the game.
//!
//! A chat message may span several lines. Each line is wrapped into its own
//! console command, attributed to the sender, and recognised commands are
//! additionally handed to the command handler.

use tokio::sync::mpsc;
use tracing::debug;

use crate::common::{Command, InboundChatLine};

const ANNOUNCE_COLOR: &str = "#7289DA";

/// Where a single inbound line goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRoute {
    /// Wrapped console command for the game.
    pub console_command: String,
    /// Set when the line is exactly a known command.
    pub command: Option<Command>,
}

/// Escape text so it stays inside a single-quoted Lua string literal.
///
/// Backslashes go first, otherwise `\'` from the user would close the string.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Wrap an attributed line into the command sent over the console.
///
/// In achievement mode the line goes in as plain chat, since scripted
/// commands would disable achievements on the save.
pub fn format_console_command(line: &str, achievement_mode: bool) -> String {
    let line = escape(line);
    if achievement_mode {
        format!("[color={}][Discord]{}[/color]", ANNOUNCE_COLOR, line)
    } else {
        format!(
            "/silent-command game.print('[color={}][Discord]{}[/color]')",
            ANNOUNCE_COLOR, line
        )
    }
}

/// Split a chat message into per-line routes, in order.
///
/// Trailing `\r` is stripped from each part. Unlike a plain `split('\n')`,
/// empty parts are skipped instead of being sent as a bare `[sender]: `.
pub fn route_inbound(message: &InboundChatLine, achievement_mode: bool) -> Vec<InboundRoute> {
    message
        .text
        .split('\n')
        .map(|part| part.strip_suffix('\r').unwrap_or(part))
        .filter(|part| !part.is_empty())
        .map(|part| InboundRoute {
            console_command: format_console_command(
                &format!("[{}]: {}", message.sender, part),
                achievement_mode,
            ),
            command: Command::parse(part),
        })
        .collect()
}

/// Hand every route of a message to the relay channels.
///
/// A command goes out before the console line it came from. Returns `false`
/// once a channel has closed, meaning the relay is shutting down.
pub async fn dispatch_inbound(
    message: &InboundChatLine,
    achievement_mode: bool,
    to_game: &mpsc::Sender<String>,
    commands: &mpsc::Sender<Command>,
) -> bool {
    for route in route_inbound(message, achievement_mode) {
        if let Some(command) = route.command {
            if commands.send(command).await.is_err() {
                debug!("Command channel closed, dropping inbound chat");
                return false;
            }
        }
        if to_game.send(route.console_command).await.is_err() {
            debug!("Game channel closed, dropping inbound chat");
            return false;
        }
    }
    true
}
