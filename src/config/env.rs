//! Environment variable access for configuration.
//!
//! Settings come from the process environment, optionally seeded from a
//! `.env` file in the working directory:
//! - `DISCORD_TOKEN` - Discord bot token
//! - `DISCORD_CHANNEL_ID` - bridged channel
//! - `RCON_IP`, `RCON_PORT`, `RCON_PASSWORD` - game remote console
//! - `FACTORIO_LOG` - server console log, `MOD_LOG` - companion mod log
//! - `POLL_LOG`, `ALL_ROCKET_LAUNCHES`, `ACHIEVEMENT_MODE`, `SEND_GPS_PING`,
//!   `SEND_JOIN_LEAVE` - optional feature flags
//! - `LOG_LEVEL` - optional log verbosity

use std::collections::HashMap;
use std::env;

use crate::common::error::ConfigError;

/// Variables that must be present and non-empty.
pub const REQUIRED_VARS: [&str; 6] = [
    "DISCORD_TOKEN",
    "DISCORD_CHANNEL_ID",
    "RCON_IP",
    "RCON_PORT",
    "RCON_PASSWORD",
    "FACTORIO_LOG",
];

/// Optional variables.
pub const OPTIONAL_VARS: [&str; 7] = [
    "MOD_LOG",
    "POLL_LOG",
    "ALL_ROCKET_LAUNCHES",
    "ACHIEVEMENT_MODE",
    "SEND_GPS_PING",
    "SEND_JOIN_LEAVE",
    "LOG_LEVEL",
];

/// Snapshot of the raw configuration values.
///
/// Empty values are treated as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings {
    values: HashMap<&'static str, String>,
}

impl EnvSettings {
    /// Collect all known keys through a lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = REQUIRED_VARS
            .iter()
            .chain(OPTIONAL_VARS.iter())
            .filter_map(|&key| {
                lookup(key)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v))
            })
            .collect();
        Self { values }
    }

    /// Collect all known keys from the process environment.
    pub fn from_process_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Load `.env` from the working directory if one exists.
///
/// Existing process variables are not overridden. A missing file is fine,
/// an unreadable or malformed one is not.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::DotEnv {
            message: e.to_string(),
        }),
    }
}

/// Parse a boolean flag value.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Map a `LOG_LEVEL` value to a tracing level. Unknown or missing is info.
pub fn parse_log_level(value: Option<&str>) -> tracing::Level {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("trace") => tracing::Level::TRACE,
        Some("debug") => tracing::Level::DEBUG,
        Some("warn") | Some("warning") => tracing::Level::WARN,
        Some("error") | Some("fatal") | Some("panic") => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Raw `LOG_LEVEL` from the process environment, read before config loading.
pub fn log_level_from_env() -> Option<String> {
    env::var("LOG_LEVEL").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_skips_blank_values() {
        let settings = EnvSettings::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("  abc  ".to_string()),
            "MOD_LOG" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(settings.get("DISCORD_TOKEN"), Some("abc"));
        assert_eq!(settings.get("MOD_LOG"), None);
        assert_eq!(settings.get("RCON_IP"), None);
    }

    #[test]
    fn test_from_lookup_ignores_unknown_keys() {
        let settings = EnvSettings::from_lookup(|_| Some("x".to_string()));
        assert_eq!(settings.get("SOMETHING_ELSE"), None);
        assert_eq!(settings.get("LOG_LEVEL"), Some("x"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("Off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("y"), None);
        assert_eq!(parse_bool("n"), None);
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_log_level() {
        use tracing::Level;
        assert_eq!(parse_log_level(Some("debug")), Level::DEBUG);
        assert_eq!(parse_log_level(Some("TRACE")), Level::TRACE);
        assert_eq!(parse_log_level(Some("warning")), Level::WARN);
        assert_eq!(parse_log_level(Some("fatal")), Level::ERROR);
        assert_eq!(parse_log_level(Some("panic")), Level::ERROR);
        assert_eq!(parse_log_level(Some("loud")), Level::INFO);
        assert_eq!(parse_log_level(None), Level::INFO);
    }
}
