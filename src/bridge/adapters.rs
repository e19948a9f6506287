//! Contracts the relay needs from the outside world.
//!
//! The relay never talks to Discord or the game directly; it goes through
//! these traits so the core can be exercised with in-memory fakes.

use serenity::async_trait;

use crate::common::error::{ChatResult, ConsoleResult};
use crate::common::PresenceUpdate;

/// Request/response access to the game's remote console.
///
/// Implementations bound every call in time and report failures as errors.
#[async_trait]
pub trait ConsoleClient: Send + Sync {
    async fn execute(&self, command: &str) -> ConsoleResult<String>;
}

/// The chat channel the relay posts to.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_message(&self, text: &str) -> ChatResult<()>;
    async fn set_presence(&self, presence: &PresenceUpdate) -> ChatResult<()>;
}
