//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
///
/// Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingVar { name: String },

    #[error("Config validation failed:\n{message}")]
    Validation { message: String },

    #[error("Failed to load .env file: {message}")]
    DotEnv { message: String },
}

/// Remote console (RCON) errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Failed to connect to {address}: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("RCON password rejected by server")]
    AuthRejected,

    #[error("RCON request timed out")]
    Timeout,

    #[error("RCON connection closed by remote")]
    ConnectionClosed,

    #[error("Invalid RCON frame: {message}")]
    Protocol { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chat platform errors.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat gateway is not connected yet")]
    NotConnected,

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Result type alias for console operations.
pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;

/// Result type alias for chat operations.
pub type ChatResult<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_error_display() {
        let err = ConsoleError::ConnectFailed {
            address: "127.0.0.1:27015".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(err.to_string(), "Failed to connect to 127.0.0.1:27015: refused");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: ConsoleError = io.into();
        assert!(matches!(err, ConsoleError::Io(_)));
    }
}
