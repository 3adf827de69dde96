//! Marquee command-line front end
//!
//! Resolves settings, opens the configured repository (populating it from the
//! dataset when needed), then runs a single command against it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use marquee_common::config::{BackendKind, Overrides, Settings};
use marquee_common::search::{search_movies, MovieQuery};
use marquee_common::services::{authenticate, post_review, register_user};
use marquee_common::{open_repository, CatalogueRepository, ReviewTarget};

/// Command-line arguments for marquee
#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(about = "Browse, search and review the movie catalogue")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/marquee/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend: memory or sqlite
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Movie dataset CSV file
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Wipe the database and load the dataset again
    #[arg(long, global = true)]
    reseed: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find movies by actor, director and genre (all given filters must match)
    Search {
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        director: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        /// Print JSON instead of one line per movie
        #[arg(long)]
        json: bool,
    },
    /// Show one movie, actor, director or genre with its reviews
    Show {
        kind: Kind,
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a user account
    Register {
        username: String,
        #[arg(long, env = "MARQUEE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Rate and comment on a movie, actor, director or genre
    Review {
        kind: Kind,
        name: String,
        #[arg(long)]
        user: String,
        #[arg(long, env = "MARQUEE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Rating from 1 to 10
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
    },
    /// Print entity counts
    Stats,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Movie,
    Actor,
    Director,
    Genre,
}

impl Kind {
    fn target(self, name: String) -> ReviewTarget {
        match self {
            Kind::Movie => ReviewTarget::Movie(name),
            Kind::Actor => ReviewTarget::Actor(name),
            Kind::Director => ReviewTarget::Director(name),
            Kind::Genre => ReviewTarget::Genre(name),
        }
    }
}

type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Install the subscriber. RUST_LOG wins; otherwise start from the CLI level
/// and let `apply_log_level` adjust once settings are resolved.
fn init_tracing(cli_level: Option<&str>) -> Option<FilterHandle> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        return None;
    }

    let (layer, handle) = reload::Layer::new(EnvFilter::new(cli_level.unwrap_or("info")));
    tracing_subscriber::registry()
        .with(layer)
        .with(tracing_subscriber::fmt::layer())
        .init();
    Some(handle)
}

fn apply_log_level(handle: Option<FilterHandle>, level: &str) -> Result<()> {
    if let Some(handle) = handle {
        handle
            .modify(|filter| *filter = EnvFilter::new(level))
            .context("Failed to apply log level")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let handle = init_tracing(args.log_level.as_deref());

    let overrides = Overrides {
        config_file: args.config.clone(),
        backend: args.backend,
        dataset: args.dataset.clone(),
        database: args.database.clone(),
        log_level: args.log_level.clone(),
        reseed: args.reseed,
    };
    let settings = Settings::resolve(&overrides).context("Failed to resolve settings")?;
    apply_log_level(handle, &settings.log_level)?;

    info!("Backend: {}", settings.backend);
    info!("Dataset: {}", settings.dataset_path.display());
    if settings.backend == BackendKind::Sqlite {
        info!("Database: {}", settings.database_path.display());
    }

    let (repo, summary) = open_repository(&settings)
        .await
        .context("Failed to open catalogue repository")?;
    if let Some(summary) = summary {
        info!("Loaded {}", summary);
    }

    let mutates = matches!(args.command, Command::Register { .. } | Command::Review { .. });
    if mutates && settings.backend == BackendKind::Memory {
        warn!("Memory backend selected: this change is lost when the command exits");
    }

    run(args.command, repo.as_ref()).await
}

async fn run(command: Command, repo: &dyn CatalogueRepository) -> Result<()> {
    match command {
        Command::Search {
            actor,
            director,
            genre,
            json,
        } => {
            let query = MovieQuery {
                actor,
                director,
                genre,
            };
            let movies = search_movies(repo, &query).await.context("Search failed")?;
            if json {
                print_json(&movies)?;
            } else if movies.is_empty() {
                println!("No movies found");
            } else {
                for movie in &movies {
                    println!(
                        "{} | {} | {}",
                        movie,
                        movie.director().unwrap_or("-"),
                        movie.genres().join(", ")
                    );
                }
            }
        }

        Command::Show { kind, name, json } => show(repo, kind, &name, json).await?,

        Command::Register { username, password } => {
            let user = register_user(repo, &username, &password)
                .await
                .context("Registration failed")?;
            println!("Registered '{}'", user.username());
        }

        Command::Review {
            kind,
            name,
            user,
            password,
            rating,
            comment,
        } => {
            let user = authenticate(repo, &user, &password)
                .await
                .context("Sign-in failed")?;
            let review = post_review(repo, user.username(), kind.target(name), &comment, rating)
                .await
                .context("Review rejected")?;
            println!("Review stored for {}", review.target());
        }

        Command::Stats => {
            let stats = Stats {
                movies: repo.get_all_movies().await?.len(),
                actors: repo.get_all_actors().await?.len(),
                directors: repo.get_all_directors().await?.len(),
                genres: repo.get_all_genres().await?.len(),
                reviews: repo.get_all_reviews().await?.len(),
            };
            print_json(&stats)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct Stats {
    movies: usize,
    actors: usize,
    directors: usize,
    genres: usize,
    reviews: usize,
}

async fn show(repo: &dyn CatalogueRepository, kind: Kind, name: &str, json: bool) -> Result<()> {
    match kind {
        Kind::Movie => {
            let Some(movie) = repo.get_movie(name).await? else {
                bail!("No movie titled '{}'", name);
            };
            if json {
                return print_json(&movie);
            }
            println!("{}", movie);
            println!("  Director:  {}", movie.director().unwrap_or("-"));
            println!("  Actors:    {}", movie.actors().join(", "));
            println!("  Genres:    {}", movie.genres().join(", "));
            println!("  Runtime:   {} min", movie.runtime_minutes);
            println!("  Rating:    {:.1} ({} votes)", movie.rating, movie.votes);
            if let Some(revenue) = movie.revenue {
                println!("  Revenue:   ${:.2}M", revenue);
            }
            if let Some(metascore) = movie.metascore {
                println!("  Metascore: {}", metascore);
            }
            println!("  {}", movie.description);
            print_reviews(movie.reviews());
        }
        Kind::Actor => {
            let Some(actor) = repo.get_actor(name).await? else {
                bail!("No actor named '{}'", name);
            };
            if json {
                return print_json(&actor);
            }
            print_named(&actor.to_string(), actor.average_rating(), actor.rating_count());
            print_reviews(actor.reviews());
        }
        Kind::Director => {
            let Some(director) = repo.get_director(name).await? else {
                bail!("No director named '{}'", name);
            };
            if json {
                return print_json(&director);
            }
            print_named(
                &director.to_string(),
                director.average_rating(),
                director.rating_count(),
            );
            print_reviews(director.reviews());
        }
        Kind::Genre => {
            let Some(genre) = repo.get_genre(name).await? else {
                bail!("No genre named '{}'", name);
            };
            if json {
                return print_json(&genre);
            }
            print_named(&genre.to_string(), genre.average_rating(), genre.rating_count());
            print_reviews(genre.reviews());
        }
    }
    Ok(())
}

fn print_named(name: &str, average: Option<f32>, count: u32) {
    match average {
        Some(average) => println!("{} ({:.1}/10 from {} reviews)", name, average, count),
        None => println!("{} (not rated yet)", name),
    }
}

fn print_reviews(reviews: &[marquee_common::Review]) {
    for review in reviews {
        println!(
            "  [{}] {} {}/10: {}",
            review.timestamp().format("%Y-%m-%d %H:%M"),
            review.username(),
            review.rating(),
            review.comment()
        );
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode JSON")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_search() {
        let args = Args::parse_from([
            "marquee",
            "--backend",
            "sqlite",
            "search",
            "--actor",
            "Tom Hanks",
            "--json",
        ]);
        assert_eq!(args.backend, Some(BackendKind::Sqlite));
        match args.command {
            Command::Search { actor, json, .. } => {
                assert_eq!(actor.as_deref(), Some("Tom Hanks"));
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_args_reject_unknown_backend() {
        assert!(Args::try_parse_from(["marquee", "--backend", "oracle", "stats"]).is_err());
    }

    #[test]
    fn test_review_target_kind() {
        let target = Kind::Director.target("Ridley Scott".to_string());
        assert_eq!(target, ReviewTarget::Director("Ridley Scott".to_string()));
    }
}
