//! Movie search by actor, director and genre
//!
//! Runs over `get_all_movies()`, so it behaves the same on every backend.

use crate::model::Movie;
use crate::repository::CatalogueRepository;
use crate::Result;

/// Search criteria; unset fields match everything, set fields must all match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieQuery {
    pub actor: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
}

impl MovieQuery {
    pub fn by_actor(name: impl Into<String>) -> Self {
        Self {
            actor: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_director(name: impl Into<String>) -> Self {
        Self {
            director: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_genre(name: impl Into<String>) -> Self {
        Self {
            genre: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actor.is_none() && self.director.is_none() && self.genre.is_none()
    }

    /// Exact, case-sensitive name match on every set criterion
    pub fn matches(&self, movie: &Movie) -> bool {
        self.actor.as_deref().map_or(true, |name| movie.has_actor(name))
            && self
                .director
                .as_deref()
                .map_or(true, |name| movie.is_directed_by(name))
            && self.genre.as_deref().map_or(true, |name| movie.has_genre(name))
    }
}

/// Movies matching `query`, in catalogue order
pub async fn search_movies(
    repo: &dyn CatalogueRepository,
    query: &MovieQuery,
) -> Result<Vec<Movie>> {
    let movies = repo.get_all_movies().await?;
    if query.is_empty() {
        return Ok(movies);
    }
    Ok(movies.into_iter().filter(|m| query.matches(m)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Actor, Director, Genre};

    fn movie(title: &str, director: &str, actors: &[&str], genres: &[&str]) -> Movie {
        let mut movie = Movie::new(title, 2016).unwrap();
        movie.set_director(&Director::new(director).unwrap());
        for name in actors {
            movie.add_actor(&Actor::new(*name).unwrap());
        }
        for name in genres {
            movie.add_genre(&Genre::new(*name).unwrap());
        }
        movie
    }

    #[test]
    fn test_empty_query_matches_all() {
        let query = MovieQuery::default();
        assert!(query.is_empty());
        assert!(query.matches(&movie("Split", "M. Night Shyamalan", &[], &[])));
    }

    #[test]
    fn test_criteria_combine() {
        let split = movie(
            "Split",
            "M. Night Shyamalan",
            &["James McAvoy", "Anya Taylor-Joy"],
            &["Horror", "Thriller"],
        );

        assert!(MovieQuery::by_actor("James McAvoy").matches(&split));
        assert!(MovieQuery::by_director("M. Night Shyamalan").matches(&split));
        assert!(MovieQuery::by_genre("Thriller").matches(&split));
        assert!(!MovieQuery::by_genre("thriller").matches(&split));

        let query = MovieQuery {
            actor: Some("James McAvoy".to_string()),
            genre: Some("Comedy".to_string()),
            director: None,
        };
        assert!(!query.matches(&split));
    }
}
