//! Log pipeline worker: tail, classify, format, hand off.
//!
//! One worker runs per tailed file. For every line it publishes the
//! presence update (if any) before the chat message (if any).

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::bridge::state::PlayerCountTracker;
use crate::common::{OutboundChatMessage, PresenceUpdate};
use crate::config::types::FeatureFlags;
use crate::game::classifier::classify;
use crate::game::formatter::{format_event, FormattedEvent};
use crate::game::tailer::LogTailer;

/// Producer ends used by a log worker.
#[derive(Debug, Clone)]
pub struct PipelineSenders {
    pub to_chat: mpsc::Sender<OutboundChatMessage>,
    pub presence: mpsc::Sender<PresenceUpdate>,
}

impl PipelineSenders {
    /// Publish one formatted event. Returns `false` once a channel closed.
    pub async fn publish(&self, formatted: FormattedEvent) -> bool {
        if let Some(presence) = formatted.presence {
            if self.presence.send(presence).await.is_err() {
                debug!("Presence channel closed (shutdown in progress)");
                return false;
            }
        }
        if let Some(message) = formatted.message {
            if self.to_chat.send(message).await.is_err() {
                debug!("Chat channel closed (shutdown in progress)");
                return false;
            }
        }
        true
    }
}

/// Classify and format one raw line.
pub fn process_line(
    line: &str,
    features: &FeatureFlags,
    players: &PlayerCountTracker,
) -> FormattedEvent {
    debug!(line = %line, "Read line from Factorio log");
    format_event(&classify(line), features, players)
}

/// Run a log worker until shutdown is signalled or the relay closes.
pub async fn run_log_pipeline(
    mut tailer: LogTailer,
    features: FeatureFlags,
    players: Arc<PlayerCountTracker>,
    senders: PipelineSenders,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let path = tailer.path().display().to_string();
    info!(path = %path, "Log worker started");

    loop {
        let line = tokio::select! {
            biased;
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
            line = tailer.next_line() => line,
        };

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(path = %path, "Error while tailing log file: {}", e);
                tokio::time::sleep(tailer.poll_interval()).await;
                continue;
            }
        };

        let formatted = process_line(&line, &features, &players);
        if !senders.publish(formatted).await {
            break;
        }
    }

    info!(path = %path, "Log worker ended");
}
