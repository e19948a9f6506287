//! Discord message event handling.
//!
//! Turns messages posted in the bridged channel into console commands and
//! chat commands on the relay channels.

use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, UserId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::bridge::inbound::dispatch_inbound;
use crate::common::{Command, InboundChatLine, OutboundChatMessage};
use crate::discord::resolver::process_discord_to_game;

/// Reply posted for a bare `ping`.
pub const PONG: &str = "Pong!";

/// Senders the inbound handler feeds.
#[derive(Debug, Clone)]
pub struct InboundSenders {
    pub to_game: mpsc::Sender<String>,
    pub commands: mpsc::Sender<Command>,
    pub to_chat: mpsc::Sender<OutboundChatMessage>,
}

/// Handler for messages in the bridged channel.
pub struct InboundHandler {
    channel_id: ChannelId,
    achievement_mode: bool,
    senders: InboundSenders,
}

impl InboundHandler {
    pub fn new(channel_id: ChannelId, achievement_mode: bool, senders: InboundSenders) -> Self {
        Self {
            channel_id,
            achievement_mode,
            senders,
        }
    }

    /// Whether a message should be relayed into the game.
    pub fn accepts(
        &self,
        bot_id: UserId,
        author_id: UserId,
        author_is_bot: bool,
        channel_id: ChannelId,
    ) -> bool {
        author_id != bot_id && channel_id == self.channel_id && !author_is_bot
    }

    /// Handle a Discord message. Returns `false` once the relay has shut down.
    pub async fn handle_message(&self, bot_id: UserId, message: &Message) -> bool {
        if !self.accepts(bot_id, message.author.id, message.author.bot, message.channel_id) {
            return true;
        }

        debug!(author = %message.author.name, "Received message on Discord: {}", message.content);

        // Guild nickname if set, otherwise the account name
        let sender = message
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .unwrap_or_else(|| message.author.name.clone());

        let mentioned: Vec<(u64, String)> = message
            .mentions
            .iter()
            .map(|user| (user.id.get(), user.name.clone()))
            .collect();
        let text = process_discord_to_game(
            &message.content,
            message.attachments.iter().map(|a| a.url.as_str()),
            &mentioned,
        );

        self.relay(message.content == "ping", sender, text).await
    }

    /// Relay prepared text from `sender`, answering `ping` first.
    pub async fn relay(&self, is_ping: bool, sender: String, text: String) -> bool {
        if is_ping && self.senders.to_chat.send(PONG.to_string()).await.is_err() {
            debug!("Chat channel closed, dropping ping reply");
            return false;
        }

        let line = InboundChatLine { sender, text };
        dispatch_inbound(
            &line,
            self.achievement_mode,
            &self.senders.to_game,
            &self.senders.commands,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Receivers {
        to_game: mpsc::Receiver<String>,
        commands: mpsc::Receiver<Command>,
        to_chat: mpsc::Receiver<OutboundChatMessage>,
    }

    fn make_handler(achievement_mode: bool) -> (InboundHandler, Receivers) {
        let (to_game, to_game_rx) = mpsc::channel(8);
        let (commands, commands_rx) = mpsc::channel(8);
        let (to_chat, to_chat_rx) = mpsc::channel(8);
        let handler = InboundHandler::new(
            ChannelId::new(100),
            achievement_mode,
            InboundSenders {
                to_game,
                commands,
                to_chat,
            },
        );
        (
            handler,
            Receivers {
                to_game: to_game_rx,
                commands: commands_rx,
                to_chat: to_chat_rx,
            },
        )
    }

    #[test]
    fn test_accepts_only_bridged_channel_from_humans() {
        let (handler, _rx) = make_handler(false);
        let bot = UserId::new(1);
        let human = UserId::new(2);

        assert!(handler.accepts(bot, human, false, ChannelId::new(100)));
        assert!(!handler.accepts(bot, bot, true, ChannelId::new(100)));
        assert!(!handler.accepts(bot, human, false, ChannelId::new(101)));
        assert!(!handler.accepts(bot, UserId::new(3), true, ChannelId::new(100)));
    }

    #[tokio::test]
    async fn test_ping_gets_pong_and_is_relayed() {
        let (handler, mut rx) = make_handler(true);

        assert!(handler.relay(true, "alice".to_string(), "ping".to_string()).await);

        assert_eq!(rx.to_chat.recv().await.as_deref(), Some("Pong!"));
        assert_eq!(
            rx.to_game.recv().await.as_deref(),
            Some("[color=#7289DA][Discord][alice]: ping[/color]")
        );
    }

    #[tokio::test]
    async fn test_command_line_goes_to_both_channels() {
        let (handler, mut rx) = make_handler(false);

        assert!(handler.relay(false, "bob".to_string(), "!seed".to_string()).await);

        assert_eq!(rx.commands.recv().await, Some(Command::Seed));
        assert_eq!(
            rx.to_game.recv().await.as_deref(),
            Some("/silent-command game.print('[color=#7289DA][Discord][bob]: !seed[/color]')")
        );
        drop(handler);
        assert_eq!(rx.to_chat.recv().await, None);
    }

    #[tokio::test]
    async fn test_relay_reports_shutdown() {
        let (handler, rx) = make_handler(false);
        drop(rx);

        assert!(!handler.relay(false, "bob".to_string(), "hello".to_string()).await);
    }
}
