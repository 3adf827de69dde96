//! # Marquee Common Library
//!
//! Storage-agnostic core of the Marquee movie catalogue:
//! - Domain model (movies, actors, directors, genres, reviews, users)
//! - Dataset ingestion from the flat CSV file
//! - Repository trait with in-memory and SQLite backends
//! - Search, credential and review services built on the repository
//! - Configuration loading

pub mod config;
pub mod credentials;
pub mod error;
pub mod ingest;
pub mod model;
pub mod repository;
pub mod search;
pub mod services;

pub use error::{EntityKind, Error, Result};
pub use model::{Actor, Director, Genre, Movie, Review, ReviewTarget, User};
pub use repository::{
    open_repository, CatalogueRepository, MemoryRepository, SharedRepository, SqliteRepository,
};
