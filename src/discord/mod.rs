//! Discord bot integration.
//!
//! This module provides the Discord side of the relay: the gateway client,
//! inbound message handling, and the chat sink for outbound messages and
//! presence.

pub mod client;
pub mod handler;
pub mod resolver;
pub mod sink;

// Re-export main types for external use
pub use client::DiscordBotBuilder;
pub use handler::{InboundHandler, InboundSenders};
pub use sink::DiscordSink;
