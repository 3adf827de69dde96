//! In-process repository backed by hash maps
//!
//! One `RwLock` guards every container: writes take it exclusively, reads
//! share it. Key order vectors keep `get_all_*` in insertion order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::CatalogueRepository;
use crate::model::{Actor, Director, Genre, Movie, Review, ReviewTarget, User};
use crate::{EntityKind, Error, Result};

/// Entities of one kind keyed by identity, remembering insertion order
struct Keyed<T> {
    kind: EntityKind,
    items: HashMap<String, T>,
    order: Vec<String>,
}

impl<T: Clone> Keyed<T> {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, key: &str, item: T) -> Result<()> {
        if self.items.contains_key(key) {
            return Err(Error::duplicate(self.kind, key));
        }
        self.items.insert(key.to_string(), item);
        self.order.push(key.to_string());
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<T> {
        self.items.get(key).cloned()
    }

    /// Mutable access for appending reviews; misses become `UnknownReference`
    fn get_mut(&mut self, key: &str) -> Result<&mut T> {
        let kind = self.kind;
        self.items
            .get_mut(key)
            .ok_or_else(|| Error::unknown(kind, key))
    }

    fn require(&self, key: &str) -> Result<()> {
        if self.contains(key) {
            Ok(())
        } else {
            Err(Error::unknown(self.kind, key))
        }
    }

    fn all(&self) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|key| self.items.get(key).cloned())
            .collect()
    }
}

struct Store {
    movies: Keyed<Movie>,
    actors: Keyed<Actor>,
    directors: Keyed<Director>,
    genres: Keyed<Genre>,
    users: Keyed<User>,
    reviews: Vec<Review>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            movies: Keyed::new(EntityKind::Movie),
            actors: Keyed::new(EntityKind::Actor),
            directors: Keyed::new(EntityKind::Director),
            genres: Keyed::new(EntityKind::Genre),
            users: Keyed::new(EntityKind::User),
            reviews: Vec::new(),
        }
    }
}

/// Process-local repository; the reference and test backend
///
/// Clone-friendly via Arc: clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogueRepository for MemoryRepository {
    async fn add_movie(&self, movie: Movie) -> Result<()> {
        let mut store = self.store.write().await;

        if store.movies.contains(movie.title()) {
            return Err(Error::duplicate(EntityKind::Movie, movie.title()));
        }
        if let Some(director) = movie.director() {
            store.directors.require(director)?;
        }
        for actor in movie.actors() {
            store.actors.require(actor)?;
        }
        for genre in movie.genres() {
            store.genres.require(genre)?;
        }

        let title = movie.title().to_string();
        store.movies.insert(&title, movie.without_reviews())?;
        debug!("Stored movie '{}'", title);
        Ok(())
    }

    async fn get_movie(&self, title: &str) -> Result<Option<Movie>> {
        Ok(self.store.read().await.movies.get(title))
    }

    async fn get_all_movies(&self) -> Result<Vec<Movie>> {
        Ok(self.store.read().await.movies.all())
    }

    async fn add_actor(&self, actor: Actor) -> Result<()> {
        let mut store = self.store.write().await;
        let name = actor.name().to_string();
        store.actors.insert(&name, actor.without_reviews())
    }

    async fn get_actor(&self, name: &str) -> Result<Option<Actor>> {
        Ok(self.store.read().await.actors.get(name))
    }

    async fn get_all_actors(&self) -> Result<Vec<Actor>> {
        Ok(self.store.read().await.actors.all())
    }

    async fn add_director(&self, director: Director) -> Result<()> {
        let mut store = self.store.write().await;
        let name = director.name().to_string();
        store.directors.insert(&name, director.without_reviews())
    }

    async fn get_director(&self, name: &str) -> Result<Option<Director>> {
        Ok(self.store.read().await.directors.get(name))
    }

    async fn get_all_directors(&self) -> Result<Vec<Director>> {
        Ok(self.store.read().await.directors.all())
    }

    async fn add_genre(&self, genre: Genre) -> Result<()> {
        let mut store = self.store.write().await;
        let name = genre.name().to_string();
        store.genres.insert(&name, genre.without_reviews())
    }

    async fn get_genre(&self, name: &str) -> Result<Option<Genre>> {
        Ok(self.store.read().await.genres.get(name))
    }

    async fn get_all_genres(&self) -> Result<Vec<Genre>> {
        Ok(self.store.read().await.genres.all())
    }

    async fn add_user(&self, user: User) -> Result<()> {
        let mut store = self.store.write().await;
        let username = user.username().to_string();
        store.users.insert(&username, user)?;
        debug!("Registered user '{}'", username);
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.store.read().await.users.get(&username.to_lowercase()))
    }

    async fn add_review(&self, review: Review) -> Result<()> {
        let mut store = self.store.write().await;
        store.users.require(review.username())?;

        // Resolve the target before touching anything so a miss leaves no trace
        match review.target() {
            ReviewTarget::Movie(title) => {
                store.movies.get_mut(title)?.add_review(review.clone());
            }
            ReviewTarget::Actor(name) => {
                store.actors.get_mut(name)?.record_review(review.clone());
            }
            ReviewTarget::Director(name) => {
                store.directors.get_mut(name)?.record_review(review.clone());
            }
            ReviewTarget::Genre(name) => {
                store.genres.get_mut(name)?.record_review(review.clone());
            }
        }

        debug!("Stored review by '{}' on {}", review.username(), review.target());
        store.reviews.push(review);
        Ok(())
    }

    async fn get_all_reviews(&self) -> Result<Vec<Review>> {
        Ok(self.store.read().await.reviews.clone())
    }
}
