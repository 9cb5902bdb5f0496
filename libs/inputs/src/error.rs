//! Input Error Types
//!
//! Configuration and setup failures surfaced by the ingestion front-end.
//! Transient runtime I/O errors are handled in place by the input loops
//! (logged and retried, or fatal for a single connection only) and never
//! appear here.

use thiserror::Error;

/// Result alias for input setup operations
pub type InputResult<T> = Result<T, InputError>;

/// Errors that prevent an input from starting
#[derive(Error, Debug)]
pub enum InputError {
    /// Invalid or missing configuration value
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<&'static str>,
    },

    /// A supported encoding has no decoder entry in the configuration
    #[error("no decoder configured for encoding '{encoding}'")]
    MissingDecoder { encoding: &'static str },

    /// A configured decoder name is absent from the registry
    #[error("decoder '{name}' is not registered")]
    UnknownDecoder { name: String },

    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket setup I/O failure (file-descriptor adoption, mode flags)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InputError {
    /// Create a configuration error with optional field context
    pub fn configuration(message: impl Into<String>, field: Option<&'static str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field,
        }
    }
}
