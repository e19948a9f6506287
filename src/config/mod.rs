//! Configuration loading and types.

pub mod env;
pub mod types;
pub mod validate;

pub use types::*;

use crate::common::error::ConfigError;

/// Build a validated config from the process environment.
///
/// Call [`env::load_dotenv`] first so `.env` values are visible.
pub fn load_and_validate() -> Result<BotConfig, ConfigError> {
    validate::build_config(&env::EnvSettings::from_process_env())
}
