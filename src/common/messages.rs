//! Canonical message types for relay communication.
//!
//! This module defines the single source of truth for the values that
//! travel over the relay channels between the game log, the game console
//! and Discord.

use std::fmt;

/// Plain text destined for the chat channel.
pub type OutboundChatMessage = String;

/// Kind of activity shown in the bot's presence line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceKind {
    Watching,
    Listening,
}

/// Represents a change in the bot's presence. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub kind: PresenceKind,
    pub label: String,
}

impl PresenceUpdate {
    pub fn watching(label: impl Into<String>) -> Self {
        Self {
            kind: PresenceKind::Watching,
            label: label.into(),
        }
    }

    pub fn listening(label: impl Into<String>) -> Self {
        Self {
            kind: PresenceKind::Listening,
            label: label.into(),
        }
    }
}

impl fmt::Display for PresenceUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PresenceKind::Watching => write!(f, "Watching {}", self.label),
            PresenceKind::Listening => write!(f, "Listening to {}", self.label),
        }
    }
}

/// A message received from the Discord channel.
#[derive(Debug, Clone)]
pub struct InboundChatLine {
    /// Sender's Discord display name.
    pub sender: String,
    /// Message content, possibly spanning several lines.
    pub text: String,
}

/// Chat commands answered with live game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `!online` - current player count.
    Online,
    /// `!seed` - map seed.
    Seed,
    /// `!evolution` - enemy evolution factor.
    Evolution,
}

impl Command {
    /// Parse a single chat line. Only the exact literals are commands.
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            "!online" => Some(Self::Online),
            "!seed" => Some(Self::Seed),
            "!evolution" => Some(Self::Evolution),
            _ => None,
        }
    }
}
