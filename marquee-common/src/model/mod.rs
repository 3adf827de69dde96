//! Catalogue domain model
//!
//! Movies reference their director, actors and genres by identity key (name).
//! The repository holds exactly one entity per key, so two movies naming the
//! same actor resolve to the same stored `Actor`.

mod movie;
mod review;
mod taxonomy;
mod user;

pub use movie::Movie;
pub use review::{Review, ReviewTarget, MAX_RATING, MIN_RATING};
pub use taxonomy::{Actor, Director, Genre};
pub use user::User;

use crate::{Error, Result};

/// Trim `value` and reject it if nothing is left
pub(crate) fn require_identity(field: &str, value: impl Into<String>) -> Result<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}
