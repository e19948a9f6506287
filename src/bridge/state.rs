//! Shared relay state.
//!
//! The player counter is the only value written from several tasks (log
//! workers on join/leave, the scheduler on refresh). All writes go through
//! a single atomic so they are serialised without a lock.

use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::bridge::adapters::ConsoleClient;
use crate::common::PresenceUpdate;

/// Console command that reports the number of connected players.
pub const PLAYER_COUNT_COMMAND: &str = "/players online count";

/// Presence shown while players are connected.
pub const PRESENCE_ACTIVE: &str = "the factory grow";

/// Presence shown while the server is empty.
pub const PRESENCE_IDLE: &str = "the world burn";

/// Process-wide player counter.
///
/// Join/leave adjust it; a console poll overwrites it. Not clamped at zero:
/// the next poll is the resync point.
#[derive(Debug, Default)]
pub struct PlayerCountTracker {
    online: AtomicI64,
}

impl PlayerCountTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join. Returns the new count.
    pub fn joined(&self) -> i64 {
        self.online.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a leave. Returns the new count.
    pub fn left(&self) -> i64 {
        self.online.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Replace the count with an authoritative value.
    pub fn overwrite(&self, count: i64) {
        self.online.store(count, Ordering::SeqCst);
    }

    pub fn current(&self) -> i64 {
        self.online.load(Ordering::SeqCst)
    }
}

/// Presence matching a player count.
pub fn presence_for_count(count: i64) -> PresenceUpdate {
    if count > 0 {
        PresenceUpdate::watching(PRESENCE_ACTIVE)
    } else {
        PresenceUpdate::watching(PRESENCE_IDLE)
    }
}

/// Extract the count from a response like `Online players (3):`.
pub fn parse_player_count(response: &str) -> Option<i64> {
    let (_, after_open) = response.split_once('(')?;
    let (count, _) = after_open.split_once(')')?;
    count.trim().parse().ok()
}

/// Poll the console for the player count, store it, and publish presence.
///
/// Failures are logged and the refresh is skipped; the counter is left
/// untouched. Returns the new count on success.
pub async fn refresh_player_count(
    console: &dyn ConsoleClient,
    players: &PlayerCountTracker,
    presence_tx: &mpsc::Sender<PresenceUpdate>,
) -> Option<i64> {
    let response = match console.execute(PLAYER_COUNT_COMMAND).await {
        Ok(response) => response,
        Err(e) => {
            error!("Could not get player count from Factorio: {}", e);
            return None;
        }
    };

    let Some(count) = parse_player_count(&response) else {
        warn!(response = %response.trim(), "Could not parse player count from Factorio, skipping refresh");
        return None;
    };

    players.overwrite(count);
    debug!("Player count refreshed: {}", count);

    if presence_tx.send(presence_for_count(count)).await.is_err() {
        debug!("Presence channel closed (shutdown in progress)");
    }
    Some(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::adapters::testing::FakeConsole;

    #[test]
    fn test_join_leave_arithmetic() {
        let players = PlayerCountTracker::new();
        assert_eq!(players.joined(), 1);
        assert_eq!(players.joined(), 2);
        assert_eq!(players.left(), 1);
        assert_eq!(players.left(), 0);
        // Missed joins can drive it negative until the next poll.
        assert_eq!(players.left(), -1);
        players.overwrite(4);
        assert_eq!(players.current(), 4);
    }

    #[test]
    fn test_parse_player_count() {
        assert_eq!(parse_player_count("Online players (3):\n  Alice (online)"), Some(3));
        assert_eq!(parse_player_count("Online players (0):"), Some(0));
        assert_eq!(parse_player_count("Online players ( 12 ):"), Some(12));
        assert_eq!(parse_player_count("Online players:"), None);
        assert_eq!(parse_player_count("Online players (many):"), None);
        assert_eq!(parse_player_count("Online players (3"), None);
    }

    #[test]
    fn test_presence_for_count() {
        assert_eq!(presence_for_count(2), PresenceUpdate::watching("the factory grow"));
        assert_eq!(presence_for_count(0), PresenceUpdate::watching("the world burn"));
        assert_eq!(presence_for_count(-1), PresenceUpdate::watching("the world burn"));
    }

    #[tokio::test]
    async fn test_refresh_overwrites_and_publishes() {
        let console = FakeConsole::new().respond("Online players (5):");
        let players = PlayerCountTracker::new();
        players.joined();
        let (tx, mut rx) = mpsc::channel(1);

        let count = refresh_player_count(&console, &players, &tx).await;

        assert_eq!(count, Some(5));
        assert_eq!(players.current(), 5);
        assert_eq!(console.commands(), vec![PLAYER_COUNT_COMMAND.to_string()]);
        assert_eq!(rx.recv().await, Some(PresenceUpdate::watching("the factory grow")));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_counter() {
        let players = PlayerCountTracker::new();
        players.overwrite(2);
        let (tx, mut rx) = mpsc::channel(1);

        let console = FakeConsole::new().fail();
        assert_eq!(refresh_player_count(&console, &players, &tx).await, None);

        let console = FakeConsole::new().respond("Unknown command");
        assert_eq!(refresh_player_count(&console, &players, &tx).await, None);

        assert_eq!(players.current(), 2);
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }
}
