//! Chat commands (!online, !seed, !evolution).
//!
//! Answers commands from the Discord channel with live game state. The
//! handler runs as the single consumer of the command channel, so the seed
//! cache it owns needs no further synchronisation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::bridge::adapters::ConsoleClient;
use crate::bridge::state::PlayerCountTracker;
use crate::common::{Command, OutboundChatMessage};

/// Reply used when the console cannot answer.
pub const UNKNOWN_REPLY: &str = "Unknown";

/// Command handler for chat commands.
pub struct CommandHandler {
    console: Arc<dyn ConsoleClient>,
    players: Arc<PlayerCountTracker>,
    /// Map seed, fetched on first use. Failures are not cached.
    seed: Option<String>,
}

impl CommandHandler {
    pub fn new(console: Arc<dyn ConsoleClient>, players: Arc<PlayerCountTracker>) -> Self {
        Self {
            console,
            players,
            seed: None,
        }
    }

    /// Produce the chat reply for a command.
    pub async fn reply_to(&mut self, command: Command) -> OutboundChatMessage {
        match command {
            Command::Online => format!("{} players online", self.players.current()),
            Command::Seed => self.seed().await,
            Command::Evolution => match self.console.execute("/evolution").await {
                Ok(response) => response.trim().to_string(),
                Err(e) => {
                    error!("Could not get evolution from Factorio: {}", e);
                    UNKNOWN_REPLY.to_string()
                }
            },
        }
    }

    async fn seed(&mut self) -> String {
        if let Some(ref seed) = self.seed {
            return seed.clone();
        }
        match self.console.execute("/seed").await {
            Ok(response) => {
                let seed = response.trim().to_string();
                self.seed = Some(seed.clone());
                seed
            }
            Err(e) => {
                error!("Could not get seed from Factorio: {}", e);
                UNKNOWN_REPLY.to_string()
            }
        }
    }

    /// Answer commands until the command channel closes.
    pub async fn run(
        mut self,
        mut commands_rx: mpsc::Receiver<Command>,
        replies_tx: mpsc::Sender<OutboundChatMessage>,
    ) {
        while let Some(command) = commands_rx.recv().await {
            info!("Handling chat command {:?}", command);
            let reply = self.reply_to(command).await;
            if replies_tx.send(reply).await.is_err() {
                debug!("Chat channel closed, dropping command reply");
            }
        }
        info!("Command handler ended");
    }
}
