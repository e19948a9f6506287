//! Factorio remote console (Source RCON protocol).

pub mod client;
pub mod codec;

pub use client::RconClient;
