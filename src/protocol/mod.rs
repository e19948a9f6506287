//! Wire protocols.

pub mod rcon;
