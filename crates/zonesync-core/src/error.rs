//! Error types for the zonesync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zonesync system
#[derive(Error, Debug)]
pub enum Error {
    /// WAN address resolution errors
    #[error("address resolver error: {0}")]
    Resolver(String),

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    Provider(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Cron schedule parsing/registration errors
    #[error("schedule error: {0}")]
    Schedule(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an address resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create a DNS provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a schedule error
    pub fn schedule(msg: impl Into<String>) -> Self {
        Self::Schedule(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
