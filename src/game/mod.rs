//! Factorio log handling.
//!
//! This module contains:
//! - Log file tailing
//! - Line classification into structured events
//! - Event formatting for Discord
//! - The per-file pipeline worker tying them together

pub mod classifier;
pub mod formatter;
pub mod pipeline;
pub mod tailer;

// Re-export commonly used types
pub use pipeline::{run_log_pipeline, PipelineSenders};
pub use tailer::LogTailer;
