//! Common error types for Marquee

use std::fmt;

use thiserror::Error;

/// Common result type for Marquee operations
pub type Result<T> = std::result::Result<T, Error>;

/// Entity kinds that carry an identity key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Movie,
    Actor,
    Director,
    Genre,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Movie => "movie",
            EntityKind::Actor => "actor",
            EntityKind::Director => "director",
            EntityKind::Genre => "genre",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

/// Errors raised by the catalogue core
///
/// Lookup misses are not errors: `get_*` operations return `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset file is missing or malformed; `row` is the 1-based line number
    #[error("Ingestion error{}: {message}", at_row(.row))]
    Ingestion { row: Option<u64>, message: String },

    /// An entity with the same identity key is already stored
    #[error("Duplicate {kind}: {key}")]
    Duplicate { kind: EntityKind, key: String },

    /// A write refers to an entity that is not stored
    #[error("Unknown {kind}: {key}")]
    UnknownReference { kind: EntityKind, key: String },

    /// Relational backend failure or unreadable stored data (wraps sqlx::Error)
    #[error("Storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    /// Invalid user input or constructor argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Username unknown or password mismatch
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn at_row(row: &Option<u64>) -> String {
    match row {
        Some(row) => format!(" at row {}", row),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn ingestion(row: Option<u64>, message: impl Into<String>) -> Self {
        Error::Ingestion {
            row,
            message: message.into(),
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, key: impl Into<String>) -> Self {
        Error::Duplicate {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn unknown(kind: EntityKind, key: impl Into<String>) -> Self {
        Error::UnknownReference {
            kind,
            key: key.into(),
        }
    }
}
