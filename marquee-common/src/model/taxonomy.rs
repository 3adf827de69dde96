//! Actor, Director and Genre entities
//!
//! All three share one shape: a case-sensitive name as identity, an aggregate
//! rating fed by reviews, and the reviews posted about the entity itself.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::{require_identity, Review};
use crate::Result;

macro_rules! named_entity {
    ($(#[$meta:meta])* $entity:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize)]
        pub struct $entity {
            name: String,
            rating_total: u32,
            rating_count: u32,
            reviews: Vec<Review>,
        }

        impl $entity {
            pub fn new(name: impl Into<String>) -> Result<Self> {
                Ok(Self {
                    name: require_identity($field, name)?,
                    rating_total: 0,
                    rating_count: 0,
                    reviews: Vec::new(),
                })
            }

            /// Rebuild a stored entity without replaying its reviews
            pub(crate) fn restore(
                name: String,
                rating_total: u32,
                rating_count: u32,
                reviews: Vec<Review>,
            ) -> Self {
                Self {
                    name,
                    rating_total,
                    rating_count,
                    reviews,
                }
            }

            /// Drop reviews and aggregates so the value enters a store fresh
            pub(crate) fn without_reviews(self) -> Self {
                Self::restore(self.name, 0, 0, Vec::new())
            }

            pub fn name(&self) -> &str {
                &self.name
            }

            /// Sum of all review ratings
            pub fn rating_total(&self) -> u32 {
                self.rating_total
            }

            pub fn rating_count(&self) -> u32 {
                self.rating_count
            }

            /// Mean review rating, `None` until the first review arrives
            pub fn average_rating(&self) -> Option<f32> {
                if self.rating_count == 0 {
                    None
                } else {
                    Some(self.rating_total as f32 / self.rating_count as f32)
                }
            }

            pub fn reviews(&self) -> &[Review] {
                &self.reviews
            }

            /// Append a review and fold its rating into the aggregate
            pub fn record_review(&mut self, review: Review) {
                self.rating_total += u32::from(review.rating());
                self.rating_count += 1;
                self.reviews.push(review);
            }
        }

        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                self.name == other.name
            }
        }

        impl Eq for $entity {}

        impl Hash for $entity {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.name.hash(state);
            }
        }

        impl PartialOrd for $entity {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $entity {
            fn cmp(&self, other: &Self) -> Ordering {
                self.name.cmp(&other.name)
            }
        }

        impl fmt::Display for $entity {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.name)
            }
        }
    };
}

named_entity!(
    /// A performer credited on one or more movies
    Actor,
    "actor name"
);

named_entity!(
    /// A movie's director
    Director,
    "director name"
);

named_entity!(
    /// A genre label such as "Sci-Fi"
    Genre,
    "genre name"
);
