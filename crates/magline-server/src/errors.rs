//! Server Errors
//!
//! Error types for the magline server.

use magline_crypto::CryptoError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Server is already running
    #[error("Server is already running")]
    AlreadyRunning,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identity key could not be loaded or generated
    #[error("Identity key error: {0}")]
    Key(#[from] CryptoError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
