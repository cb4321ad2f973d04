//! Error types for zs-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for zs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for zs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key contains a forbidden segment
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Malformed command-line path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No complete set of authentication parameters could be resolved
    #[error("Missing authentication parameters: {0}")]
    AuthMissingParameter(String),

    /// Authentication or permission error reported by the backend
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidKey(_) => 2,                           // UsageError
            Error::InvalidPath(_) => 2,                          // UsageError
            Error::Config(_) => 2,                               // UsageError
            Error::AuthMissingParameter(_) => 2,                 // UsageError
            Error::Network(_) => 3,                              // NetworkError
            Error::Auth(_) => 4,                                 // AuthError
            Error::NotFound(_) | Error::ProfileNotFound(_) => 5, // NotFound
            _ => 1,                                              // GeneralError
        }
    }

    /// Whether this error is a not-found condition
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
