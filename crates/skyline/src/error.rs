//! Error types for skyline.
//!
//! Every fallible operation in the crate returns [`Error`]. The first group of
//! variants is the domain taxonomy that callers and the HTTP layer act on; the
//! rest wrap infrastructure failures and all count as internal errors.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for skyline operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// The client sent a malformed or missing payload.
    #[error("{0}")]
    BadRequest(String),

    /// Decoding, recognition or I/O failed while serving a request.
    #[error("{0}")]
    Internal(String),

    /// A required credential or setting is missing.
    #[error("{0}")]
    Configuration(String),

    /// Domain input could not be parsed.
    #[error("{0}")]
    InvalidInput(String),

    /// The upstream flight-data API failed or answered with garbage.
    #[error("{0}")]
    Upstream(String),

    /// The upstream API succeeded but returned nothing usable.
    #[error("no flight data")]
    NoData,

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for skyline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a new upstream error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Check if this error was caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::InvalidInput(_))
    }

    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Configuration(_) | Self::ConfigLoad(_) | Self::ConfigValidation { .. } => {
                "configuration"
            }
            Self::InvalidInput(_) => "invalid_input",
            Self::Upstream(_) => "upstream",
            Self::NoData => "no_data",
            _ => "internal",
        }
    }
}
