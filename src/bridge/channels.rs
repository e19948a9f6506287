//! Relay channel management.
//!
//! Four directed hand-off channels connect the producers (log workers,
//! Discord inbound handler, scheduler) with their single consumers:
//!
//! - `to_chat`: formatted log events and command replies -> Discord channel
//! - `to_game`: wrapped console commands -> game console
//! - `commands`: recognised chat commands -> command handler
//! - `presence`: presence updates -> Discord presence
//!
//! Every channel holds a single slot, so a slow consumer holds up its
//! producers instead of letting a backlog build. A channel closes once
//! every sender clone is dropped, which is how consumers learn to stop.

use tokio::sync::mpsc;

use crate::common::{Command, OutboundChatMessage, PresenceUpdate};

/// Slots per channel. One gives hand-off semantics.
pub const HANDOFF_CAPACITY: usize = 1;

/// Producer ends. Cheap to clone; each producer keeps only what it uses.
#[derive(Debug, Clone)]
pub struct RelaySenders {
    /// Sender for game -> Discord messages.
    pub to_chat: mpsc::Sender<OutboundChatMessage>,
    /// Sender for Discord -> game console commands.
    pub to_game: mpsc::Sender<String>,
    /// Sender for chat commands.
    pub commands: mpsc::Sender<Command>,
    /// Sender for presence updates.
    pub presence: mpsc::Sender<PresenceUpdate>,
}

/// Consumer ends. Each receiver is moved into exactly one consumer task.
#[derive(Debug)]
pub struct RelayReceivers {
    /// Receiver for game -> Discord messages (chat sink listens).
    pub to_chat: mpsc::Receiver<OutboundChatMessage>,
    /// Receiver for console commands (console sender listens).
    pub to_game: mpsc::Receiver<String>,
    /// Receiver for chat commands (command handler listens).
    pub commands: mpsc::Receiver<Command>,
    /// Receiver for presence updates (chat sink listens).
    pub presence: mpsc::Receiver<PresenceUpdate>,
}

/// Bundle of all channels created for the relay.
#[derive(Debug)]
pub struct RelayChannels {
    pub senders: RelaySenders,
    pub receivers: RelayReceivers,
}

impl RelayChannels {
    /// Create a new set of relay channels.
    pub fn new() -> Self {
        let (to_chat_tx, to_chat_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (to_game_tx, to_game_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (commands_tx, commands_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (presence_tx, presence_rx) = mpsc::channel(HANDOFF_CAPACITY);

        Self {
            senders: RelaySenders {
                to_chat: to_chat_tx,
                to_game: to_game_tx,
                commands: commands_tx,
                presence: presence_tx,
            },
            receivers: RelayReceivers {
                to_chat: to_chat_rx,
                to_game: to_game_rx,
                commands: commands_rx,
                presence: presence_rx,
            },
        }
    }
}

impl Default for RelayChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channels_are_fifo() {
        let RelayChannels { senders, mut receivers } = RelayChannels::new();

        let producer = tokio::spawn(async move {
            for i in 0..5 {
                senders.to_chat.send(format!("message {}", i)).await.unwrap();
            }
        });

        for i in 0..5 {
            assert_eq!(receivers.to_chat.recv().await, Some(format!("message {}", i)));
        }
        producer.await.unwrap();
        assert_eq!(receivers.to_chat.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_channel_applies_backpressure() {
        let RelayChannels { senders, receivers } = RelayChannels::new();

        senders.to_game.try_send("first".to_string()).unwrap();
        assert!(matches!(
            senders.to_game.try_send("second".to_string()),
            Err(mpsc::error::TrySendError::Full(_))
        ));
        drop(receivers);
    }

    #[tokio::test]
    async fn test_channel_closes_when_all_senders_dropped() {
        let RelayChannels { senders, mut receivers } = RelayChannels::new();
        let clone = senders.clone();
        drop(senders);

        clone.commands.send(Command::Seed).await.unwrap();
        drop(clone);

        assert_eq!(receivers.commands.recv().await, Some(Command::Seed));
        assert_eq!(receivers.commands.recv().await, None);
        assert_eq!(receivers.presence.recv().await, None);
    }
}
