//! SQLite-backed repository
//!
//! Each write runs in its own transaction. A transaction that is dropped
//! before `commit()` rolls back, so every early `?` return leaves the
//! database untouched.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::schema::create_schema;
use super::CatalogueRepository;
use crate::ingest::{Catalogue, IngestSummary};
use crate::model::{Actor, Director, Genre, Movie, Review, ReviewTarget, User};
use crate::{EntityKind, Error, Result};

/// Table and key column holding each entity kind
fn table_of(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::Movie => ("movies", "title"),
        EntityKind::Actor => ("actors", "name"),
        EntityKind::Director => ("directors", "name"),
        EntityKind::Genre => ("genres", "name"),
        EntityKind::User => ("users", "username"),
    }
}

/// A stored value that no valid write could have produced
fn corrupt(column: &str, message: String) -> Error {
    Error::Backend(sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    })
}

/// Convert a stored integer back into its domain type
fn stored<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T> {
    T::try_from(value).map_err(|_| corrupt(column, format!("value out of range: {}", value)))
}

/// Map a key clash on insert to `Duplicate`, anything else to `Backend`
fn insert_error(error: sqlx::Error, kind: EntityKind, key: &str) -> Error {
    let clash = error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if clash {
        Error::duplicate(kind, key)
    } else {
        Error::Backend(error)
    }
}

/// Shared columns of directors, actors and genres
struct NamedRow {
    name: String,
    rating_total: u32,
    rating_count: u32,
    reviews: Vec<Review>,
}

const REVIEW_COLUMNS: &str = "username, target_kind, target_key, comment, rating, created_at";

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let kind: String = row.try_get("target_kind")?;
    let key: String = row.try_get("target_key")?;
    let rating: i64 = row.try_get("rating")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Review::with_timestamp(
        row.try_get::<String, _>("username")?,
        ReviewTarget::from_label(&kind, key).map_err(|e| corrupt("target_kind", e.to_string()))?,
        row.try_get::<String, _>("comment")?,
        stored(rating, "rating")?,
        created_at,
    )
}

fn movie_from_row(row: &SqliteRow) -> Result<Movie> {
    let mut movie = Movie::new(
        row.try_get::<String, _>("title")?,
        stored(row.try_get("release_year")?, "release_year")?,
    )?;
    movie.description = row.try_get("description")?;
    if let Some(director) = row.try_get::<Option<String>, _>("director")? {
        movie.set_director_name(director);
    }
    movie.runtime_minutes = stored(row.try_get("runtime_minutes")?, "runtime_minutes")?;
    movie.rating = row.try_get::<f64, _>("rating")? as f32;
    movie.votes = stored(row.try_get("votes")?, "votes")?;
    movie.revenue = row.try_get("revenue")?;
    movie.metascore = match row.try_get::<Option<i64>, _>("metascore")? {
        Some(score) => Some(stored(score, "metascore")?),
        None => None,
    };
    Ok(movie)
}

/// Count rows whose key column equals `key`
async fn exists(conn: &mut SqliteConnection, kind: EntityKind, key: &str) -> Result<bool> {
    let (table, column) = table_of(kind);
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", table, column);
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(key)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

async fn require(conn: &mut SqliteConnection, kind: EntityKind, key: &str) -> Result<()> {
    if exists(conn, kind, key).await? {
        Ok(())
    } else {
        Err(Error::unknown(kind, key))
    }
}

// Every write helper issues its INSERT before any read. The first statement
// of a transaction then takes the write lock, waiting out `busy_timeout`,
// instead of failing to upgrade a stale read snapshot.

async fn insert_named(conn: &mut SqliteConnection, kind: EntityKind, name: &str) -> Result<()> {
    let (table, _) = table_of(kind);
    sqlx::query(&format!(
        "INSERT INTO {} (name, rating_total, rating_count) VALUES (?, 0, 0)",
        table
    ))
    .bind(name)
    .execute(&mut *conn)
    .await
    .map_err(|e| insert_error(e, kind, name))?;
    Ok(())
}

async fn insert_movie(conn: &mut SqliteConnection, movie: &Movie) -> Result<()> {
    let votes = i64::try_from(movie.votes)
        .map_err(|_| Error::InvalidInput(format!("vote count too large: {}", movie.votes)))?;

    sqlx::query(
        r#"
        INSERT INTO movies (
            title, release_year, description, director, runtime_minutes,
            rating, votes, revenue, metascore
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(movie.title())
    .bind(i64::from(movie.release_year))
    .bind(&movie.description)
    .bind(movie.director())
    .bind(i64::from(movie.runtime_minutes))
    .bind(f64::from(movie.rating))
    .bind(votes)
    .bind(movie.revenue)
    .bind(movie.metascore.map(i64::from))
    .execute(&mut *conn)
    .await
    .map_err(|e| insert_error(e, EntityKind::Movie, movie.title()))?;

    // Foreign keys are deferred to commit; report the first missing one by name
    if let Some(director) = movie.director() {
        require(conn, EntityKind::Director, director).await?;
    }
    for actor in movie.actors() {
        require(conn, EntityKind::Actor, actor).await?;
    }
    for genre in movie.genres() {
        require(conn, EntityKind::Genre, genre).await?;
    }

    for (position, actor) in movie.actors().iter().enumerate() {
        sqlx::query(
            "INSERT INTO movie_actors (movie_title, actor_name, position) VALUES (?, ?, ?)",
        )
        .bind(movie.title())
        .bind(actor)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    for (position, genre) in movie.genres().iter().enumerate() {
        sqlx::query(
            "INSERT INTO movie_genres (movie_title, genre_name, position) VALUES (?, ?, ?)",
        )
        .bind(movie.title())
        .bind(genre)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

const CATALOGUE_TABLES: [&str; 4] = ["movies", "actors", "directors", "genres"];

async fn delete_all(conn: &mut SqliteConnection) -> Result<()> {
    for table in [
        "reviews",
        "movie_actors",
        "movie_genres",
        "movies",
        "actors",
        "directors",
        "genres",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Relational backend over a SQLite connection pool
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (creating if needed) a database file and ensure the schema
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        Self::from_pool(pool).await
    }

    /// Private in-memory database; a single connection keeps it alive
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if missing
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        create_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// True when no movie, actor, director or genre is stored
    pub async fn is_empty(&self) -> Result<bool> {
        for table in CATALOGUE_TABLES {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await?;
            if count > 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Delete every row, users included
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        delete_all(&mut tx).await?;
        tx.commit().await?;
        info!("Cleared all catalogue tables");
        Ok(())
    }

    /// Wipe the database and store `catalogue` in a single transaction
    ///
    /// Either the whole catalogue lands or the previous contents survive.
    pub async fn replace_catalogue(&self, catalogue: &Catalogue) -> Result<IngestSummary> {
        let mut tx = self.pool.begin().await?;
        delete_all(&mut tx).await?;

        for director in catalogue.directors() {
            insert_named(&mut tx, EntityKind::Director, director.name()).await?;
        }
        for actor in catalogue.actors() {
            insert_named(&mut tx, EntityKind::Actor, actor.name()).await?;
        }
        for genre in catalogue.genres() {
            insert_named(&mut tx, EntityKind::Genre, genre.name()).await?;
        }
        for movie in catalogue.movies() {
            insert_movie(&mut tx, movie).await?;
        }

        tx.commit().await?;
        let summary = catalogue.summary();
        info!("Replaced database contents with {}", summary);
        Ok(summary)
    }

    async fn reviews_of(&self, target: &ReviewTarget) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE target_kind = ? AND target_key = ? ORDER BY id",
            REVIEW_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(target.label())
            .bind(target.key())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(review_from_row).collect()
    }

    async fn load_named(&self, target: ReviewTarget) -> Result<Option<NamedRow>> {
        let (table, _) = table_of(target.kind());
        let row = sqlx::query(&format!(
            "SELECT name, rating_total, rating_count FROM {} WHERE name = ?",
            table
        ))
        .bind(target.key())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(NamedRow {
            name: row.try_get("name")?,
            rating_total: stored(row.try_get("rating_total")?, "rating_total")?,
            rating_count: stored(row.try_get("rating_count")?, "rating_count")?,
            reviews: self.reviews_of(&target).await?,
        }))
    }

    /// All rows of a named table in insertion order, reviews attached
    async fn load_all_named(&self, kind: EntityKind) -> Result<Vec<NamedRow>> {
        let (table, _) = table_of(kind);
        let rows = sqlx::query(&format!(
            "SELECT name, rating_total, rating_count FROM {} ORDER BY rowid",
            table
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut reviews = self.reviews_by_key(kind).await?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("name")?;
                Ok(NamedRow {
                    reviews: reviews.remove(&name).unwrap_or_default(),
                    rating_total: stored(row.try_get("rating_total")?, "rating_total")?,
                    rating_count: stored(row.try_get("rating_count")?, "rating_count")?,
                    name,
                })
            })
            .collect()
    }

    /// Every review on one kind of target, grouped by target key
    ///
    /// The stored `target_kind` label matches `EntityKind`'s Display form.
    async fn reviews_by_key(&self, kind: EntityKind) -> Result<HashMap<String, Vec<Review>>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE target_kind = ? ORDER BY id",
            REVIEW_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(kind.to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<String, Vec<Review>> = HashMap::new();
        for row in &rows {
            let review = review_from_row(row)?;
            grouped
                .entry(review.target().key().to_string())
                .or_default()
                .push(review);
        }
        Ok(grouped)
    }

    /// (movie, name) link rows of a join table in position order
    async fn links(&self, table: &str, column: &str, title: Option<&str>) -> Result<Vec<(String, String)>> {
        let rows = match title {
            Some(title) => {
                sqlx::query(&format!(
                    "SELECT movie_title, {} AS name FROM {} WHERE movie_title = ? ORDER BY position",
                    column, table
                ))
                .bind(title)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT movie_title, {} AS name FROM {} ORDER BY movie_title, position",
                    column, table
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| Ok((row.try_get("movie_title")?, row.try_get("name")?)))
            .collect()
    }
}

#[async_trait]
impl CatalogueRepository for SqliteRepository {
    async fn add_movie(&self, movie: Movie) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_movie(&mut tx, &movie).await?;
        tx.commit().await?;
        debug!("Stored movie '{}'", movie.title());
        Ok(())
    }

    async fn get_movie(&self, title: &str) -> Result<Option<Movie>> {
        let row = sqlx::query("SELECT * FROM movies WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut movie = movie_from_row(&row)?;
        for (_, actor) in self.links("movie_actors", "actor_name", Some(title)).await? {
            movie.add_actor_name(&actor);
        }
        for (_, genre) in self.links("movie_genres", "genre_name", Some(title)).await? {
            movie.add_genre_name(&genre);
        }
        for review in self.reviews_of(&ReviewTarget::Movie(title.to_string())).await? {
            movie.add_review(review);
        }
        Ok(Some(movie))
    }

    async fn get_all_movies(&self) -> Result<Vec<Movie>> {
        let rows = sqlx::query("SELECT * FROM movies ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        let mut actors: HashMap<String, Vec<String>> = HashMap::new();
        for (title, actor) in self.links("movie_actors", "actor_name", None).await? {
            actors.entry(title).or_default().push(actor);
        }
        let mut genres: HashMap<String, Vec<String>> = HashMap::new();
        for (title, genre) in self.links("movie_genres", "genre_name", None).await? {
            genres.entry(title).or_default().push(genre);
        }
        let mut reviews = self.reviews_by_key(EntityKind::Movie).await?;

        rows.iter()
            .map(|row| {
                let mut movie = movie_from_row(row)?;
                for actor in actors.remove(movie.title()).unwrap_or_default() {
                    movie.add_actor_name(&actor);
                }
                for genre in genres.remove(movie.title()).unwrap_or_default() {
                    movie.add_genre_name(&genre);
                }
                for review in reviews.remove(movie.title()).unwrap_or_default() {
                    movie.add_review(review);
                }
                Ok(movie)
            })
            .collect()
    }

    async fn add_actor(&self, actor: Actor) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_named(&mut tx, EntityKind::Actor, actor.name()).await?;
        tx.commit().await?;
        debug!("Stored actor '{}'", actor.name());
        Ok(())
    }

    async fn get_actor(&self, name: &str) -> Result<Option<Actor>> {
        Ok(self
            .load_named(ReviewTarget::Actor(name.to_string()))
            .await?
            .map(|r| Actor::restore(r.name, r.rating_total, r.rating_count, r.reviews)))
    }

    async fn get_all_actors(&self) -> Result<Vec<Actor>> {
        Ok(self
            .load_all_named(EntityKind::Actor)
            .await?
            .into_iter()
            .map(|r| Actor::restore(r.name, r.rating_total, r.rating_count, r.reviews))
            .collect())
    }

    async fn add_director(&self, director: Director) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_named(&mut tx, EntityKind::Director, director.name()).await?;
        tx.commit().await?;
        debug!("Stored director '{}'", director.name());
        Ok(())
    }

    async fn get_director(&self, name: &str) -> Result<Option<Director>> {
        Ok(self
            .load_named(ReviewTarget::Director(name.to_string()))
            .await?
            .map(|r| Director::restore(r.name, r.rating_total, r.rating_count, r.reviews)))
    }

    async fn get_all_directors(&self) -> Result<Vec<Director>> {
        Ok(self
            .load_all_named(EntityKind::Director)
            .await?
            .into_iter()
            .map(|r| Director::restore(r.name, r.rating_total, r.rating_count, r.reviews))
            .collect())
    }

    async fn add_genre(&self, genre: Genre) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_named(&mut tx, EntityKind::Genre, genre.name()).await?;
        tx.commit().await?;
        debug!("Stored genre '{}'", genre.name());
        Ok(())
    }

    async fn get_genre(&self, name: &str) -> Result<Option<Genre>> {
        Ok(self
            .load_named(ReviewTarget::Genre(name.to_string()))
            .await?
            .map(|r| Genre::restore(r.name, r.rating_total, r.rating_count, r.reviews)))
    }

    async fn get_all_genres(&self) -> Result<Vec<Genre>> {
        Ok(self
            .load_all_named(EntityKind::Genre)
            .await?
            .into_iter()
            .map(|r| Genre::restore(r.name, r.rating_total, r.rating_count, r.reviews))
            .collect())
    }

    async fn add_user(&self, user: User) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(user.username())
            .bind(user.password_hash())
            .execute(&mut *tx)
            .await
            .map_err(|e| insert_error(e, EntityKind::User, user.username()))?;

        tx.commit().await?;
        debug!("Registered user '{}'", user.username());
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT username, password_hash FROM users WHERE username = ?")
            .bind(username.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(User::new(
                row.try_get::<String, _>("username")?,
                row.try_get::<String, _>("password_hash")?,
            )?)),
            None => Ok(None),
        }
    }

    async fn add_review(&self, review: Review) -> Result<()> {
        let target = review.target();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO reviews ({}) VALUES (?, ?, ?, ?, ?, ?)",
            REVIEW_COLUMNS
        ))
        .bind(review.username())
        .bind(target.label())
        .bind(target.key())
        .bind(review.comment())
        .bind(i64::from(review.rating()))
        .bind(review.timestamp())
        .execute(&mut *tx)
        .await?;

        require(&mut tx, EntityKind::User, review.username()).await?;
        require(&mut tx, target.kind(), target.key()).await?;

        if target.kind() != EntityKind::Movie {
            let (table, _) = table_of(target.kind());
            sqlx::query(&format!(
                "UPDATE {} SET rating_total = rating_total + ?, rating_count = rating_count + 1 WHERE name = ?",
                table
            ))
            .bind(i64::from(review.rating()))
            .bind(target.key())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Stored review by '{}' on {}", review.username(), target);
        Ok(())
    }

    async fn get_all_reviews(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query(&format!("SELECT {} FROM reviews ORDER BY id", REVIEW_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(review_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        create_schema(repo.pool()).await.unwrap();
        assert!(repo.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("marquee.db");

        let repo = SqliteRepository::open(&db_path).await.unwrap();
        repo.add_genre(Genre::new("Drama").unwrap()).await.unwrap();
        drop(repo);

        assert!(db_path.exists());
        let reopened = SqliteRepository::open(&db_path).await.unwrap();
        assert!(reopened.get_genre("Drama").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_movie_insert_rolls_back() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.add_actor(Actor::new("Chris Pratt").unwrap()).await.unwrap();

        let mut movie = Movie::new("Guardians of the Galaxy", 2014).unwrap();
        movie.add_actor(&Actor::new("Chris Pratt").unwrap());
        movie.add_genre(&Genre::new("Action").unwrap());

        let result = repo.add_movie(movie).await;
        assert!(matches!(
            result,
            Err(Error::UnknownReference { kind: EntityKind::Genre, .. })
        ));
        assert!(repo.get_movie("Guardians of the Galaxy").await.unwrap().is_none());
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movie_actors")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.add_director(Director::new("James Gunn").unwrap()).await.unwrap();
        repo.add_user(User::new("dave", "hash").unwrap()).await.unwrap();

        repo.clear().await.unwrap();

        assert!(repo.get_director("James Gunn").await.unwrap().is_none());
        assert!(repo.get_user("dave").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_is_empty_counts_every_catalogue_table() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        assert!(repo.is_empty().await.unwrap());

        repo.add_director(Director::new("Ridley Scott").unwrap()).await.unwrap();
        assert!(!repo.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_catalogue_swaps_contents() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.add_director(Director::new("Leftover Director").unwrap()).await.unwrap();
        repo.add_user(User::new("dave", "hash").unwrap()).await.unwrap();

        let content = "Rank,Title,Genre,Description,Director,Actors,Year,Runtime (Minutes),Rating,Votes,Revenue (Millions),Metascore\n\
             1,Prometheus,\"Adventure,Mystery\",Explorers.,Ridley Scott,\"Noomi Rapace, Michael Fassbender\",2012,124,7.0,485820,126.46,65\n";
        let catalogue =
            Catalogue::from_rows(crate::ingest::parse_dataset(content).unwrap()).unwrap();

        let summary = repo.replace_catalogue(&catalogue).await.unwrap();

        assert_eq!(summary.movies, 1);
        assert_eq!(summary.actors, 2);
        assert!(repo.get_director("Leftover Director").await.unwrap().is_none());
        assert!(repo.get_user("dave").await.unwrap().is_none());
        let movie = repo.get_movie("Prometheus").await.unwrap().unwrap();
        assert_eq!(movie.actors(), ["Noomi Rapace", "Michael Fassbender"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_maps_to_duplicate() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.add_user(User::new("dave", "hash").unwrap()).await.unwrap();

        let result = repo.add_user(User::new("Dave", "other").unwrap()).await;
        match result {
            Err(Error::Duplicate { kind, key }) => {
                assert_eq!(kind, EntityKind::User);
                assert_eq!(key, "dave");
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_stored_value_is_backend_error() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO movies (title, release_year, description, runtime_minutes, rating, votes) \
             VALUES ('Broken', 70000, '', 90, 5.0, 10)",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let result = repo.get_movie("Broken").await;
        assert!(matches!(result, Err(Error::Backend(_))), "got {:?}", result);
    }
}
