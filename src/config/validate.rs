//! Configuration validation.
//!
//! Turns raw settings into a `BotConfig`, reporting every problem at once.

use std::path::PathBuf;

use crate::common::error::ConfigError;
use crate::config::env::{parse_bool, EnvSettings, REQUIRED_VARS};
use crate::config::types::{BotConfig, DiscordConfig, FeatureFlags, LogConfig, RconConfig};

/// Validate settings and build the configuration.
pub fn build_config(settings: &EnvSettings) -> Result<BotConfig, ConfigError> {
    let mut errors = Vec::new();

    let missing = missing_required(settings);
    if missing.len() == 1 {
        return Err(ConfigError::MissingVar {
            name: missing[0].to_string(),
        });
    }
    for name in &missing {
        errors.push(format!("{} is required", name));
    }

    let token = settings.get("DISCORD_TOKEN").unwrap_or_default();
    if token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("DISCORD_TOKEN has not been configured (still using placeholder)".to_string());
    }

    let channel_id = match settings.get("DISCORD_CHANNEL_ID").map(str::parse::<u64>) {
        Some(Ok(0)) => {
            errors.push("DISCORD_CHANNEL_ID must be non-zero".to_string());
            0
        }
        Some(Ok(id)) => id,
        Some(Err(_)) => {
            errors.push("DISCORD_CHANNEL_ID must be a numeric channel ID".to_string());
            0
        }
        None => 0,
    };

    let port = match settings.get("RCON_PORT").map(str::parse::<u16>) {
        Some(Ok(0)) => {
            errors.push("RCON_PORT must be non-zero".to_string());
            0
        }
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            errors.push(format!(
                "RCON_PORT '{}' is not a valid port",
                settings.get("RCON_PORT").unwrap_or_default()
            ));
            0
        }
        None => 0,
    };

    let mut flag = |key: &str| match settings.get(key) {
        None => false,
        Some(value) => parse_bool(value).unwrap_or_else(|| {
            errors.push(format!("{} '{}' is not a boolean", key, value));
            false
        }),
    };
    let features = FeatureFlags {
        poll_log: flag("POLL_LOG"),
        all_rocket_launches: flag("ALL_ROCKET_LAUNCHES"),
        achievement_mode: flag("ACHIEVEMENT_MODE"),
        send_gps_ping: flag("SEND_GPS_PING"),
        send_join_leave: flag("SEND_JOIN_LEAVE"),
    };

    if !errors.is_empty() {
        return Err(ConfigError::Validation {
            message: errors.join("\n"),
        });
    }

    Ok(BotConfig {
        discord: DiscordConfig {
            token: token.to_string(),
            channel_id,
        },
        rcon: RconConfig {
            host: settings.get("RCON_IP").unwrap_or_default().to_string(),
            port,
            password: settings.get("RCON_PASSWORD").unwrap_or_default().to_string(),
        },
        logs: LogConfig {
            factorio_log: PathBuf::from(settings.get("FACTORIO_LOG").unwrap_or_default()),
            mod_log: settings.get("MOD_LOG").map(PathBuf::from),
        },
        features,
        log_level: settings.get("LOG_LEVEL").map(str::to_string),
    })
}

/// Required variables that are unset or empty.
pub fn missing_required(settings: &EnvSettings) -> Vec<&'static str> {
    REQUIRED_VARS
        .iter()
        .copied()
        .filter(|key| settings.get(key).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_settings(overrides: &[(&str, &str)]) -> EnvSettings {
        let mut values: HashMap<String, String> = [
            ("DISCORD_TOKEN", "valid_token_here"),
            ("DISCORD_CHANNEL_ID", "987654321"),
            ("RCON_IP", "127.0.0.1"),
            ("RCON_PORT", "27015"),
            ("RCON_PASSWORD", "hunter2"),
            ("FACTORIO_LOG", "/opt/factorio/factorio-current.log"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            values.insert(k.to_string(), v.to_string());
        }
        EnvSettings::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn test_valid_settings_pass() {
        let config = build_config(&make_settings(&[])).unwrap();
        assert_eq!(config.discord.channel_id, 987654321);
        assert_eq!(config.rcon.port, 27015);
        assert_eq!(config.logs.mod_log, None);
        assert_eq!(config.features, FeatureFlags::default());
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_single_missing_var_is_named() {
        let result = build_config(&make_settings(&[("RCON_PASSWORD", "")]));
        match result {
            Err(ConfigError::MissingVar { name }) => assert_eq!(name, "RCON_PASSWORD"),
            other => panic!("expected MissingVar, got {:?}", other),
        }
    }

    #[test]
    fn test_several_missing_vars_are_collected() {
        let settings = EnvSettings::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("token".to_string()),
            _ => None,
        });
        let err = build_config(&settings).unwrap_err().to_string();
        assert!(err.contains("RCON_IP is required"));
        assert!(err.contains("FACTORIO_LOG is required"));
        assert!(!err.contains("DISCORD_TOKEN is required"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let result = build_config(&make_settings(&[("DISCORD_TOKEN", "YOUR_DISCORD_TOKEN_HERE")]));
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_invalid_port_fails() {
        let result = build_config(&make_settings(&[("RCON_PORT", "99999")]));
        assert!(result.unwrap_err().to_string().contains("not a valid port"));

        let result = build_config(&make_settings(&[("RCON_PORT", "0")]));
        assert!(result.unwrap_err().to_string().contains("non-zero"));
    }

    #[test]
    fn test_single_bad_value_reported_as_validation() {
        match build_config(&make_settings(&[("RCON_PORT", "abc")])) {
            Err(ConfigError::Validation { message }) => {
                assert_eq!(message, "RCON_PORT 'abc' is not a valid port");
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_channel_id_fails() {
        let result = build_config(&make_settings(&[("DISCORD_CHANNEL_ID", "general")]));
        assert!(result.unwrap_err().to_string().contains("numeric channel ID"));
    }

    #[test]
    fn test_feature_flags_parsed() {
        let config = build_config(&make_settings(&[
            ("ACHIEVEMENT_MODE", "true"),
            ("SEND_JOIN_LEAVE", "1"),
            ("SEND_GPS_PING", "false"),
            ("MOD_LOG", "/opt/factorio/script-output/bot.log"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert!(config.features.achievement_mode);
        assert!(config.features.send_join_leave);
        assert!(!config.features.send_gps_ping);
        assert!(!config.features.all_rocket_launches);
        assert_eq!(
            config.logs.mod_log,
            Some(PathBuf::from("/opt/factorio/script-output/bot.log"))
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_flag_fails() {
        let result = build_config(&make_settings(&[("POLL_LOG", "sometimes")]));
        assert!(result.unwrap_err().to_string().contains("POLL_LOG 'sometimes'"));
    }

    #[test]
    fn test_missing_required() {
        assert!(missing_required(&make_settings(&[])).is_empty());
        assert_eq!(
            missing_required(&make_settings(&[("FACTORIO_LOG", "")])),
            vec!["FACTORIO_LOG"]
        );
    }
}
