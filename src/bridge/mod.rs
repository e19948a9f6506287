//! Message relay between the game and Discord.
//!
//! ## Module Structure
//!
//! - `adapters`: Traits for the game console and the chat sink
//! - `channels`: The four relay channels
//! - `commands`: Chat command handler (`!online`, `!seed`, `!evolution`)
//! - `inbound`: Discord -> game line routing
//! - `router`: One consumer task per channel
//! - `scheduler`: Cancellable periodic tasks
//! - `state`: Player counter and presence refresh

pub mod adapters;
pub mod channels;
pub mod commands;
pub mod inbound;
pub mod router;
pub mod scheduler;
pub mod state;

// Re-export main types for convenience
pub use adapters::ConsoleClient;
pub use channels::RelayChannels;
pub use router::spawn_router;
pub use scheduler::schedule;
pub use state::{refresh_player_count, PlayerCountTracker};
