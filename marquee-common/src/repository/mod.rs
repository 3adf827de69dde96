//! Storage-agnostic catalogue repository
//!
//! Consumers hold an `Arc<dyn CatalogueRepository>` built once at startup and
//! never learn which backend sits behind it.
//!
//! Contract shared by every backend:
//! - `get_*` on a missing key returns `Ok(None)`, never an error
//! - `add_*` rejects an identity-equal entity with `Error::Duplicate`
//! - `add_movie` rejects unregistered director/actor/genre references
//! - `add_review` rejects unknown users and targets, then appends the review
//!   to the global list and to its target, bumping the target's aggregate
//! - `get_all_*` preserve insertion order

mod memory;
mod schema;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendKind, Settings};
use crate::ingest::{ingest, Catalogue, IngestSummary};
use crate::model::{Actor, Director, Genre, Movie, Review, User};
use crate::Result;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    async fn add_movie(&self, movie: Movie) -> Result<()>;
    async fn get_movie(&self, title: &str) -> Result<Option<Movie>>;
    async fn get_all_movies(&self) -> Result<Vec<Movie>>;

    async fn add_actor(&self, actor: Actor) -> Result<()>;
    async fn get_actor(&self, name: &str) -> Result<Option<Actor>>;
    async fn get_all_actors(&self) -> Result<Vec<Actor>>;

    async fn add_director(&self, director: Director) -> Result<()>;
    async fn get_director(&self, name: &str) -> Result<Option<Director>>;
    async fn get_all_directors(&self) -> Result<Vec<Director>>;

    async fn add_genre(&self, genre: Genre) -> Result<()>;
    async fn get_genre(&self, name: &str) -> Result<Option<Genre>>;
    async fn get_all_genres(&self) -> Result<Vec<Genre>>;

    /// Store a user; usernames are unique ignoring case
    async fn add_user(&self, user: User) -> Result<()>;
    /// Case-insensitive lookup
    async fn get_user(&self, username: &str) -> Result<Option<User>>;

    async fn add_review(&self, review: Review) -> Result<()>;
    async fn get_all_reviews(&self) -> Result<Vec<Review>>;
}

/// Shared handle passed to every consumer
pub type SharedRepository = Arc<dyn CatalogueRepository>;

/// Build the configured backend and make sure it holds the dataset.
///
/// The memory backend is always populated from the dataset file. The SQLite
/// backend is populated only when it holds no catalogue rows, or wiped and
/// repopulated when `settings.reseed` is set. SQLite population runs in one
/// transaction, so an interrupted load leaves the database as it was.
/// Returns the summary when ingestion ran.
pub async fn open_repository(
    settings: &Settings,
) -> Result<(SharedRepository, Option<IngestSummary>)> {
    match settings.backend {
        BackendKind::Memory => {
            let repo = MemoryRepository::new();
            let summary = ingest(&settings.dataset_path, &repo).await?;
            Ok((Arc::new(repo), Some(summary)))
        }
        BackendKind::Sqlite => {
            let repo = SqliteRepository::open(&settings.database_path).await?;
            let summary = if settings.reseed {
                info!("Reseeding database from {}", settings.dataset_path.display());
                let catalogue = Catalogue::load(&settings.dataset_path)?;
                Some(repo.replace_catalogue(&catalogue).await?)
            } else if repo.is_empty().await? {
                info!("Database is empty, populating from {}", settings.dataset_path.display());
                let catalogue = Catalogue::load(&settings.dataset_path)?;
                Some(repo.replace_catalogue(&catalogue).await?)
            } else {
                None
            };
            Ok((Arc::new(repo), summary))
        }
    }
}
