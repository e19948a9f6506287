//! Consumers of the relay channels.
//!
//! Each channel has exactly one consumer task. A consumer runs until its
//! channel closes; a failed external call is logged and the item dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bridge::adapters::{ChatSink, ConsoleClient};
use crate::bridge::channels::RelayReceivers;
use crate::bridge::commands::CommandHandler;
use crate::bridge::state::PlayerCountTracker;
use crate::common::{OutboundChatMessage, PresenceUpdate};

/// Post chat-bound messages until the channel closes.
pub async fn run_chat_sender(
    sink: Arc<dyn ChatSink>,
    mut to_chat_rx: mpsc::Receiver<OutboundChatMessage>,
) {
    while let Some(message) = to_chat_rx.recv().await {
        debug!("Game -> Discord: {}", message);
        if let Err(e) = sink.send_message(&message).await {
            error!(message = %message, "Failed to post message to Discord: {}", e);
        }
    }
    info!("Chat sender ended");
}

/// Execute game-bound console commands until the channel closes.
pub async fn run_console_sender(
    console: Arc<dyn ConsoleClient>,
    mut to_game_rx: mpsc::Receiver<String>,
) {
    while let Some(command) = to_game_rx.recv().await {
        debug!("Discord -> Game: {}", command);
        if let Err(e) = console.execute(&command).await {
            error!(cmd = %command, "Unable to send message to Factorio: {}", e);
        }
    }
    info!("Console sender ended");
}

/// Apply presence updates until the channel closes.
pub async fn run_presence_sender(
    sink: Arc<dyn ChatSink>,
    mut presence_rx: mpsc::Receiver<PresenceUpdate>,
) {
    while let Some(presence) = presence_rx.recv().await {
        debug!("Updating presence: {}", presence);
        if let Err(e) = sink.set_presence(&presence).await {
            error!(presence = %presence, "Failed to update Discord presence: {}", e);
        }
    }
    info!("Presence sender ended");
}

/// Handles for the four consumer tasks.
#[derive(Debug)]
pub struct RouterTasks {
    pub chat: JoinHandle<()>,
    pub console: JoinHandle<()>,
    pub presence: JoinHandle<()>,
    pub commands: JoinHandle<()>,
}

impl RouterTasks {
    /// Wait for every consumer to finish draining.
    pub async fn join(self) {
        for (name, task) in [
            ("chat", self.chat),
            ("console", self.console),
            ("presence", self.presence),
            ("commands", self.commands),
        ] {
            if let Err(e) = task.await {
                error!("{} consumer ended abnormally: {}", name, e);
            }
        }
    }
}

/// Spawn one consumer per relay channel.
///
/// Command replies are posted through `replies_tx`, the chat-bound sender,
/// so they share ordering with other chat messages.
pub fn spawn_router(
    receivers: RelayReceivers,
    sink: Arc<dyn ChatSink>,
    console: Arc<dyn ConsoleClient>,
    players: Arc<PlayerCountTracker>,
    replies_tx: mpsc::Sender<OutboundChatMessage>,
) -> RouterTasks {
    let RelayReceivers {
        to_chat,
        to_game,
        commands,
        presence,
    } = receivers;

    let handler = CommandHandler::new(console.clone(), players);

    RouterTasks {
        chat: tokio::spawn(run_chat_sender(sink.clone(), to_chat)),
        console: tokio::spawn(run_console_sender(console, to_game)),
        presence: tokio::spawn(run_presence_sender(sink, presence)),
        commands: tokio::spawn(handler.run(commands, replies_tx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::adapters::testing::{FakeConsole, FakeSink};
    use crate::bridge::channels::RelayChannels;
    use crate::common::Command;

    #[tokio::test]
    async fn test_chat_sender_drops_failed_messages() {
        let sink = Arc::new(FakeSink::failing(1));
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run_chat_sender(sink.clone(), rx));

        tx.send("first".to_string()).await.unwrap();
        tx.send("second".to_string()).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(sink.messages(), vec!["second".to_string()]);
    }

    #[tokio::test]
    async fn test_console_sender_keeps_going_after_error() {
        let console = Arc::new(FakeConsole::new().fail().respond(""));
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run_console_sender(console.clone(), rx));

        tx.send("a".to_string()).await.unwrap();
        tx.send("b".to_string()).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(console.commands(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_presence_sender_applies_in_order() {
        let sink = Arc::new(FakeSink::new());
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run_presence_sender(sink.clone(), rx));

        tx.send(PresenceUpdate::watching("a rocket launch")).await.unwrap();
        tx.send(PresenceUpdate::listening("automation")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(
            sink.presences(),
            vec![
                PresenceUpdate::watching("a rocket launch"),
                PresenceUpdate::listening("automation"),
            ]
        );
    }

    #[tokio::test]
    async fn test_router_drains_and_stops_when_senders_drop() {
        let RelayChannels { senders, receivers } = RelayChannels::new();
        let sink = Arc::new(FakeSink::new());
        let console = Arc::new(FakeConsole::new().respond(""));
        let players = Arc::new(PlayerCountTracker::new());
        players.overwrite(2);

        let tasks = spawn_router(
            receivers,
            sink.clone(),
            console.clone(),
            players,
            senders.to_chat.clone(),
        );

        senders.to_game.send("/silent-command game.print('x')".to_string()).await.unwrap();
        senders.commands.send(Command::Online).await.unwrap();
        senders.presence.send(PresenceUpdate::watching("the factory grow")).await.unwrap();
        drop(senders);

        tasks.join().await;

        assert_eq!(sink.messages(), vec!["2 players online".to_string()]);
        assert_eq!(sink.presences(), vec![PresenceUpdate::watching("the factory grow")]);
        assert_eq!(console.commands(), vec!["/silent-command game.print('x')".to_string()]);
    }
}
