//! SQLite schema for the relational backend
//!
//! Every statement is idempotent so opening an existing database is safe.
//! Foreign keys are checked at commit; writers verify references themselves
//! after their first insert.
//! Rows are never deleted outside a full reseed, so `rowid` order is
//! insertion order.

use sqlx::SqlitePool;

use crate::Result;

/// Create all catalogue tables if they don't exist yet
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_named_table(pool, "directors").await?;
    create_named_table(pool, "actors").await?;
    create_named_table(pool, "genres").await?;
    create_movies_table(pool).await?;
    create_movie_actors_table(pool).await?;
    create_movie_genres_table(pool).await?;
    create_users_table(pool).await?;
    create_reviews_table(pool).await?;
    Ok(())
}

/// Directors, actors and genres share one layout
async fn create_named_table(pool: &SqlitePool, table: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            name TEXT PRIMARY KEY NOT NULL,
            rating_total INTEGER NOT NULL DEFAULT 0,
            rating_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
        table
    );
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            title TEXT PRIMARY KEY NOT NULL,
            release_year INTEGER NOT NULL,
            description TEXT NOT NULL,
            director TEXT REFERENCES directors(name) DEFERRABLE INITIALLY DEFERRED,
            runtime_minutes INTEGER NOT NULL,
            rating REAL NOT NULL,
            votes INTEGER NOT NULL,
            revenue REAL,
            metascore INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_movie_actors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_actors (
            movie_title TEXT NOT NULL REFERENCES movies(title) DEFERRABLE INITIALLY DEFERRED,
            actor_name TEXT NOT NULL REFERENCES actors(name) DEFERRABLE INITIALLY DEFERRED,
            position INTEGER NOT NULL,
            PRIMARY KEY (movie_title, actor_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movie_actors_actor ON movie_actors(actor_name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_movie_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_genres (
            movie_title TEXT NOT NULL REFERENCES movies(title) DEFERRABLE INITIALLY DEFERRED,
            genre_name TEXT NOT NULL REFERENCES genres(name) DEFERRABLE INITIALLY DEFERRED,
            position INTEGER NOT NULL,
            PRIMARY KEY (movie_title, genre_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movie_genres_genre ON movie_genres(genre_name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY NOT NULL,
            password_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL REFERENCES users(username) DEFERRABLE INITIALLY DEFERRED,
            target_kind TEXT NOT NULL CHECK (target_kind IN ('movie', 'actor', 'director', 'genre')),
            target_key TEXT NOT NULL,
            comment TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 10),
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_target ON reviews(target_kind, target_key)")
        .execute(pool)
        .await?;

    Ok(())
}
