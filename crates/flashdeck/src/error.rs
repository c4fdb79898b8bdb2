//! Error types for flashdeck.
//!
//! This module defines all error types used throughout the flashdeck crate.
//! Every failure is terminal to the single action that triggered it; none of
//! them leave the deck collection partially modified.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flashdeck operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Payload Errors ===
    /// An imported JSON collection or bulk text could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// A QR payload could not be decoded.
    #[error("failed to decode QR payload: {message}")]
    Decode {
        /// Description of what went wrong.
        message: String,
    },

    /// An encoded QR payload does not fit in a single code.
    #[error("QR payload is {len} characters, limit is {limit}")]
    PayloadTooLarge {
        /// Length of the encoded payload.
        len: usize,
        /// Configured maximum payload length.
        limit: usize,
    },

    /// The AI generator failed or returned an unusable response.
    #[error("deck generation failed: {message}")]
    Generation {
        /// Description of what went wrong.
        message: String,
    },

    // === Store Errors ===
    /// A deck or card referenced by an operation does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was being looked up ("deck" or "card").
        kind: &'static str,
        /// The id that was not found.
        id: String,
    },

    /// A value handed to the store would break one of its invariants.
    #[error("invalid deck data: {message}")]
    Validation {
        /// Description of the violated invariant.
        message: String,
    },

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

    // === Network Errors ===
    /// An HTTP request could not be built or sent.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized Result type for flashdeck operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new QR decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new generation error.
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a deck-not-found error.
    #[must_use]
    pub fn deck_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "deck",
            id: id.into(),
        }
    }

    /// Create a card-not-found error.
    #[must_use]
    pub fn card_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "card",
            id: id.into(),
        }
    }

    /// Check if this error is a parse failure.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Check if this error is a QR decode failure.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this error is a generation failure.
    #[must_use]
    pub fn is_generation_error(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Check if this error indicates a missing deck or card.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
