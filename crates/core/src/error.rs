//! Error types for pan-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for pan-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pan-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or non-absolute path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Malformed request parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or transport failure (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with an error envelope
    #[error("Remote error {code}: {message}")]
    Remote { code: String, message: String },

    /// A batch task ended failed or never reached a terminal state
    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::InvalidInput(_) => 2, // UsageError
            Error::Config(_) => 2,                               // UsageError
            Error::Network(_) => 3,                              // NetworkError
            Error::NotFound(_) => 5,                             // NotFound
            _ => 1,                                              // GeneralError
        }
    }

    /// Whether this error means the remote entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}
