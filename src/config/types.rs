//! Configuration type definitions.

use std::path::PathBuf;

/// Root configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord: DiscordConfig,
    pub rcon: RconConfig,
    pub logs: LogConfig,
    pub features: FeatureFlags,
    /// Raw `LOG_LEVEL` value, if any.
    pub log_level: Option<String>,
}

/// Discord bot configuration.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
    /// The single channel that is bridged to the game.
    pub channel_id: u64,
}

/// Game remote console connection.
#[derive(Debug, Clone)]
pub struct RconConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl RconConfig {
    /// `host:port` string for connecting.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log files to follow.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// The game server console log.
    pub factorio_log: PathBuf,
    /// Optional companion mod output.
    pub mod_log: Option<PathBuf>,
}

impl LogConfig {
    /// Every file that gets its own tailing worker.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.factorio_log.clone()];
        if let Some(ref mod_log) = self.mod_log {
            paths.push(mod_log.clone());
        }
        paths
    }
}

/// Boolean feature toggles. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Relaxed polling for log files on network filesystems.
    pub poll_log: bool,
    /// Announce every rocket launch instead of milestones only.
    pub all_rocket_launches: bool,
    /// Inject Discord chat as plain server messages (keeps achievements enabled).
    pub achievement_mode: bool,
    /// Relay map pings.
    pub send_gps_ping: bool,
    /// Announce players joining and leaving.
    pub send_join_leave: bool,
}
