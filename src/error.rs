//! Error handling for client construction

use thiserror::Error;

/// Errors raised while building the composed client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid or missing configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The shared HTTP client could not be built
    #[error("Initialization error: {0}")]
    Initialization(String),
}
