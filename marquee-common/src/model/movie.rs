//! Movie aggregate

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::{require_identity, Actor, Director, Genre, Review};
use crate::Result;

/// A catalogue entry, identified by its title
///
/// Director, actors and genres are held as identity keys. The actor and genre
/// lists keep first-insertion order and never contain a name twice.
#[derive(Debug, Clone, Serialize)]
pub struct Movie {
    title: String,
    pub release_year: u16,
    pub description: String,
    director: Option<String>,
    actors: Vec<String>,
    genres: Vec<String>,
    pub runtime_minutes: u32,
    pub rating: f32,
    pub votes: u64,
    /// Box-office revenue in millions; `None` when unknown
    pub revenue: Option<f64>,
    /// `None` when unknown; zero is a real score
    pub metascore: Option<u8>,
    reviews: Vec<Review>,
}

impl Movie {
    pub fn new(title: impl Into<String>, release_year: u16) -> Result<Self> {
        Ok(Self {
            title: require_identity("title", title)?,
            release_year,
            description: String::new(),
            director: None,
            actors: Vec::new(),
            genres: Vec::new(),
            runtime_minutes: 0,
            rating: 0.0,
            votes: 0,
            revenue: None,
            metascore: None,
            reviews: Vec::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn director(&self) -> Option<&str> {
        self.director.as_deref()
    }

    pub fn set_director(&mut self, director: &Director) {
        self.director = Some(director.name().to_string());
    }

    pub fn actors(&self) -> &[String] {
        &self.actors
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Credit an actor; returns false if already credited
    pub fn add_actor(&mut self, actor: &Actor) -> bool {
        self.add_actor_name(actor.name())
    }

    /// Tag a genre; returns false if already tagged
    pub fn add_genre(&mut self, genre: &Genre) -> bool {
        self.add_genre_name(genre.name())
    }

    pub fn has_actor(&self, name: &str) -> bool {
        self.actors.iter().any(|a| a == name)
    }

    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g == name)
    }

    pub fn is_directed_by(&self, name: &str) -> bool {
        self.director.as_deref() == Some(name)
    }

    pub fn add_review(&mut self, review: Review) {
        self.reviews.push(review);
    }

    /// Drop reviews so the value can enter a store as a fresh entity
    pub(crate) fn without_reviews(mut self) -> Self {
        self.reviews.clear();
        self
    }

    pub(crate) fn set_director_name(&mut self, name: String) {
        self.director = Some(name);
    }

    pub(crate) fn add_actor_name(&mut self, name: &str) -> bool {
        push_unique(&mut self.actors, name)
    }

    pub(crate) fn add_genre_name(&mut self, name: &str) -> bool {
        push_unique(&mut self.genres, name)
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) -> bool {
    if names.iter().any(|n| n == name) {
        return false;
    }
    names.push(name.to_string());
    true
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
    }
}

impl PartialOrd for Movie {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Movie {
    fn cmp(&self, other: &Self) -> Ordering {
        self.title.cmp(&other.title)
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.release_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_title_rejected() {
        assert!(Movie::new("", 2012).is_err());
        assert!(Movie::new("  ", 2012).is_err());
    }

    #[test]
    fn test_add_actor_is_idempotent() {
        let mut movie = Movie::new("Prometheus", 2012).unwrap();
        let actor = Actor::new("Noomi Rapace").unwrap();

        assert!(movie.add_actor(&actor));
        assert!(!movie.add_actor(&actor));
        assert!(!movie.add_actor(&Actor::new("Noomi Rapace").unwrap()));
        assert_eq!(movie.actors(), ["Noomi Rapace".to_string()]);
    }

    #[test]
    fn test_add_genre_is_idempotent_and_ordered() {
        let mut movie = Movie::new("Prometheus", 2012).unwrap();
        for name in ["Adventure", "Mystery", "Adventure", "Sci-Fi"] {
            movie.add_genre(&Genre::new(name).unwrap());
        }
        assert_eq!(movie.genres(), ["Adventure", "Mystery", "Sci-Fi"]);
        assert!(movie.has_genre("Mystery"));
        assert!(!movie.has_genre("mystery"));
    }

    #[test]
    fn test_identity_is_title() {
        let mut a = Movie::new("Split", 2016).unwrap();
        a.rating = 7.3;
        let b = Movie::new("Split", 2016).unwrap();
        assert_eq!(a, b);
        assert!(Movie::new("Sing", 2016).unwrap() < b);
    }

    #[test]
    fn test_director_link() {
        let mut movie = Movie::new("Prometheus", 2012).unwrap();
        assert_eq!(movie.director(), None);
        movie.set_director(&Director::new("Ridley Scott").unwrap());
        assert!(movie.is_directed_by("Ridley Scott"));
        assert_eq!(movie.to_string(), "Prometheus (2012)");
    }
}
