//! Reviews and their targets

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::require_identity;
use crate::{EntityKind, Error, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

/// The entity a review is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum ReviewTarget {
    Movie(String),
    Actor(String),
    Director(String),
    Genre(String),
}

impl ReviewTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            ReviewTarget::Movie(_) => EntityKind::Movie,
            ReviewTarget::Actor(_) => EntityKind::Actor,
            ReviewTarget::Director(_) => EntityKind::Director,
            ReviewTarget::Genre(_) => EntityKind::Genre,
        }
    }

    /// Identity key of the target entity
    pub fn key(&self) -> &str {
        match self {
            ReviewTarget::Movie(key)
            | ReviewTarget::Actor(key)
            | ReviewTarget::Director(key)
            | ReviewTarget::Genre(key) => key,
        }
    }

    /// Stored discriminator, also the Display form of the kind
    pub(crate) fn label(&self) -> &'static str {
        match self {
            ReviewTarget::Movie(_) => "movie",
            ReviewTarget::Actor(_) => "actor",
            ReviewTarget::Director(_) => "director",
            ReviewTarget::Genre(_) => "genre",
        }
    }

    pub(crate) fn from_label(label: &str, key: String) -> Result<Self> {
        match label {
            "movie" => Ok(ReviewTarget::Movie(key)),
            "actor" => Ok(ReviewTarget::Actor(key)),
            "director" => Ok(ReviewTarget::Director(key)),
            "genre" => Ok(ReviewTarget::Genre(key)),
            other => Err(Error::InvalidInput(format!(
                "unknown review target kind: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ReviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.label(), self.key())
    }
}

/// A user's rated comment on a movie, actor, director or genre
///
/// Reviews are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    username: String,
    target: ReviewTarget,
    comment: String,
    rating: u8,
    timestamp: DateTime<Utc>,
}

impl Review {
    /// Create a review stamped with the current time
    pub fn new(
        username: impl Into<String>,
        target: ReviewTarget,
        comment: impl Into<String>,
        rating: u8,
    ) -> Result<Self> {
        Self::with_timestamp(username, target, comment, rating, Utc::now())
    }

    pub fn with_timestamp(
        username: impl Into<String>,
        target: ReviewTarget,
        comment: impl Into<String>,
        rating: u8,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let username = require_identity("username", username)?.to_lowercase();
        let comment = comment.into();
        if comment.trim().is_empty() {
            return Err(Error::InvalidInput("comment must not be empty".to_string()));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(Error::InvalidInput(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, rating
            )));
        }
        Ok(Self {
            username,
            target,
            comment,
            rating,
            timestamp,
        })
    }

    /// Lower-cased username of the author
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn target(&self) -> &ReviewTarget {
        &self.target
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let target = ReviewTarget::Movie("Prometheus".to_string());
        assert!(Review::new("kurisu", target.clone(), "fine", 0).is_err());
        assert!(Review::new("kurisu", target.clone(), "fine", 11).is_err());
        assert!(Review::new("kurisu", target.clone(), "fine", 1).is_ok());
        assert!(Review::new("kurisu", target, "fine", 10).is_ok());
    }

    #[test]
    fn test_username_normalized() {
        let review = Review::new(
            "Kurisu",
            ReviewTarget::Genre("Mystery".to_string()),
            "creepy",
            7,
        )
        .unwrap();
        assert_eq!(review.username(), "kurisu");
    }

    #[test]
    fn test_blank_comment_rejected() {
        let result = Review::new("kurisu", ReviewTarget::Actor("X".to_string()), "  ", 5);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_target_label_round_trip() {
        let target = ReviewTarget::Director("Ridley Scott".to_string());
        let restored =
            ReviewTarget::from_label(target.label(), target.key().to_string()).unwrap();
        assert_eq!(restored, target);
        assert_eq!(restored.kind(), EntityKind::Director);
        assert!(ReviewTarget::from_label("studio", "x".to_string()).is_err());
    }
}
