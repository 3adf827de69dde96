//! Dataset ingestion
//!
//! Reads the movie CSV once at startup, normalizes it into a `Catalogue`
//! (one entity per actor/director/genre name, movies linked by name) and
//! registers everything into a repository.
//!
//! Column layout after the header row:
//!
//! | # | field        | # | field    |
//! |---|--------------|---|----------|
//! | 0 | id (ignored) | 6 | year     |
//! | 1 | title        | 7 | runtime  |
//! | 2 | genres (csv) | 8 | rating   |
//! | 3 | description  | 9 | votes    |
//! | 4 | director     | 10| revenue  |
//! | 5 | actors (csv) | 11| metascore|
//!
//! Any malformed row aborts ingestion; the dataset is a trusted asset, so a
//! bad row means a bad file.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::model::{Actor, Director, Genre, Movie};
use crate::repository::CatalogueRepository;
use crate::{Error, Result};

/// Number of columns every data row must have
pub const COLUMN_COUNT: usize = 12;

/// Cell value meaning "unknown" in the revenue and metascore columns
pub const NOT_AVAILABLE: &str = "N/A";

const UTF8_BOM: char = '\u{feff}';

/// One parsed data row, before deduplication
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    /// 1-based line number in the source file
    pub line: u64,
    pub title: String,
    pub genres: Vec<String>,
    pub description: String,
    pub director: String,
    pub actors: Vec<String>,
    pub release_year: u16,
    pub runtime_minutes: u32,
    pub rating: f32,
    pub votes: u64,
    pub revenue: Option<f64>,
    pub metascore: Option<u8>,
}

/// Read and parse every data row of a dataset file
pub fn read_dataset(path: &Path) -> Result<Vec<DatasetRow>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ingestion(None, format!("cannot read dataset {}: {}", path.display(), e))
    })?;
    parse_dataset(&content)
}

/// Parse dataset text; a leading byte-order mark is ignored
pub fn parse_dataset(content: &str) -> Result<Vec<DatasetRow>> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line());
            Error::ingestion(line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(parse_row(line, &record)?);
    }
    Ok(rows)
}

fn parse_row(line: u64, record: &csv::StringRecord) -> Result<DatasetRow> {
    if record.len() != COLUMN_COUNT {
        return Err(Error::ingestion(
            Some(line),
            format!("expected {} columns, found {}", COLUMN_COUNT, record.len()),
        ));
    }

    let cell = |index: usize| record.get(index).unwrap_or_default();

    let title = cell(1).to_string();
    if title.is_empty() {
        return Err(Error::ingestion(Some(line), "title is empty"));
    }
    let director = cell(4).to_string();
    if director.is_empty() {
        return Err(Error::ingestion(Some(line), "director is empty"));
    }

    Ok(DatasetRow {
        line,
        title,
        genres: split_names(cell(2)),
        description: cell(3).to_string(),
        director,
        actors: split_names(cell(5)),
        release_year: parse_number(line, "year", cell(6))?,
        runtime_minutes: parse_number(line, "runtime", cell(7))?,
        rating: parse_number(line, "rating", cell(8))?,
        votes: parse_number(line, "votes", cell(9))?,
        revenue: parse_optional(line, "revenue", cell(10))?,
        metascore: parse_optional(line, "metascore", cell(11))?,
    })
}

/// Split a comma-joined cell into trimmed, non-empty names
fn split_names(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T>(line: u64, column: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e| {
        Error::ingestion(
            Some(line),
            format!("invalid {} '{}': {}", column, value, e),
        )
    })
}

fn parse_optional<T>(line: u64, column: &str, value: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if value == NOT_AVAILABLE {
        Ok(None)
    } else {
        parse_number(line, column, value).map(Some)
    }
}

/// Entities of one kind, one per name, in first-seen order
struct Registry<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Return the entity registered under `name`, creating it on first sight
    fn intern(&mut self, name: &str, create: impl FnOnce(&str) -> Result<T>) -> Result<&T> {
        let position = match self.index.get(name) {
            Some(&position) => position,
            None => {
                self.items.push(create(name)?);
                let position = self.items.len() - 1;
                self.index.insert(name.to_string(), position);
                position
            }
        };
        Ok(&self.items[position])
    }
}

/// Counts of entities registered by one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub movies: usize,
    pub actors: usize,
    pub directors: usize,
    pub genres: usize,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} movies, {} actors, {} directors, {} genres",
            self.movies, self.actors, self.directors, self.genres
        )
    }
}

/// Fully linked, deduplicated dataset ready for a repository
pub struct Catalogue {
    movies: Registry<Movie>,
    actors: Registry<Actor>,
    directors: Registry<Director>,
    genres: Registry<Genre>,
}

impl Catalogue {
    /// Load and normalize a dataset file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading movie dataset: {}", path.display());
        Self::from_rows(read_dataset(path)?)
    }

    /// Build the linked catalogue from parsed rows
    ///
    /// A title seen again reuses the first movie: the later row's actors and
    /// genres are merged in, everything else from the first row is kept.
    pub fn from_rows(rows: Vec<DatasetRow>) -> Result<Self> {
        let mut catalogue = Self {
            movies: Registry::new(),
            actors: Registry::new(),
            directors: Registry::new(),
            genres: Registry::new(),
        };

        for row in rows {
            catalogue.add_row(row)?;
        }

        debug!(
            "Normalized dataset: {} movies, {} actors, {} directors, {} genres",
            catalogue.movies.items.len(),
            catalogue.actors.items.len(),
            catalogue.directors.items.len(),
            catalogue.genres.items.len()
        );
        Ok(catalogue)
    }

    fn add_row(&mut self, row: DatasetRow) -> Result<()> {
        let line = row.line;
        let at_row = move |e: Error| match e {
            Error::InvalidInput(message) => Error::ingestion(Some(line), message),
            other => other,
        };

        let mut actors = Vec::with_capacity(row.actors.len());
        for name in &row.actors {
            actors.push(self.actors.intern(name, |n| Actor::new(n)).map_err(at_row)?.clone());
        }
        let mut genres = Vec::with_capacity(row.genres.len());
        for name in &row.genres {
            genres.push(self.genres.intern(name, |n| Genre::new(n)).map_err(at_row)?.clone());
        }

        match self.movies.index.get(&row.title).copied() {
            Some(position) => {
                let movie = &mut self.movies.items[position];
                warn!(
                    "Row {}: title '{}' already ingested; merging actors and genres",
                    row.line, row.title
                );
                if !movie.is_directed_by(&row.director) {
                    warn!(
                        "Row {}: keeping director '{}' for '{}', ignoring '{}'",
                        row.line,
                        movie.director().unwrap_or_default(),
                        row.title,
                        row.director
                    );
                }
                for actor in &actors {
                    movie.add_actor(actor);
                }
                for genre in &genres {
                    movie.add_genre(genre);
                }
            }
            None => {
                let mut movie = Movie::new(&row.title, row.release_year).map_err(at_row)?;
                let director = self
                    .directors
                    .intern(&row.director, |n| Director::new(n))
                    .map_err(at_row)?;
                movie.description = row.description;
                movie.set_director(director);
                for actor in &actors {
                    movie.add_actor(actor);
                }
                for genre in &genres {
                    movie.add_genre(genre);
                }
                movie.runtime_minutes = row.runtime_minutes;
                movie.rating = row.rating;
                movie.votes = row.votes;
                movie.revenue = row.revenue;
                movie.metascore = row.metascore;

                self.movies.intern(&row.title, |_| Ok(movie))?;
            }
        }
        Ok(())
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies.items
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors.items
    }

    pub fn directors(&self) -> &[Director] {
        &self.directors.items
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres.items
    }

    pub fn movie(&self, title: &str) -> Option<&Movie> {
        self.movies.index.get(title).map(|&i| &self.movies.items[i])
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.index.get(name).map(|&i| &self.actors.items[i])
    }

    pub fn genre(&self, name: &str) -> Option<&Genre> {
        self.genres.index.get(name).map(|&i| &self.genres.items[i])
    }

    pub fn director(&self, name: &str) -> Option<&Director> {
        self.directors.index.get(name).map(|&i| &self.directors.items[i])
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            movies: self.movies.items.len(),
            actors: self.actors.items.len(),
            directors: self.directors.items.len(),
            genres: self.genres.items.len(),
        }
    }

    /// Register every entity, referenced kinds first so movie links resolve
    pub async fn register(self, repo: &dyn CatalogueRepository) -> Result<IngestSummary> {
        let summary = self.summary();

        for director in self.directors.items {
            repo.add_director(director).await?;
        }
        for actor in self.actors.items {
            repo.add_actor(actor).await?;
        }
        for genre in self.genres.items {
            repo.add_genre(genre).await?;
        }
        for movie in self.movies.items {
            repo.add_movie(movie).await?;
        }

        info!("Registered {}", summary);
        Ok(summary)
    }
}

/// Load a dataset file and register it into `repo`
pub async fn ingest(path: &Path, repo: &dyn CatalogueRepository) -> Result<IngestSummary> {
    Catalogue::load(path)?.register(repo).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Rank,Title,Genre,Description,Director,Actors,Year,Runtime (Minutes),Rating,Votes,Revenue (Millions),Metascore\n";

    fn dataset(rows: &[&str]) -> String {
        let mut content = HEADER.to_string();
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        content
    }

    #[test]
    fn test_parse_prometheus_row() {
        let content = dataset(&[
            r#"1,Prometheus,"Adventure,Mystery,Sci-Fi","A team of explorers...",Ridley Scott,"Noomi Rapace, Logan Marshall-Green",2012,124,7.0,275000,126.46,65"#,
        ]);

        let rows = parse_dataset(&content).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.line, 2);
        assert_eq!(row.title, "Prometheus");
        assert_eq!(row.genres, vec!["Adventure", "Mystery", "Sci-Fi"]);
        assert_eq!(row.director, "Ridley Scott");
        assert_eq!(row.actors, vec!["Noomi Rapace", "Logan Marshall-Green"]);
        assert_eq!(row.release_year, 2012);
        assert_eq!(row.runtime_minutes, 124);
        assert_eq!(row.rating, 7.0);
        assert_eq!(row.votes, 275000);
        assert_eq!(row.revenue, Some(126.46));
        assert_eq!(row.metascore, Some(65));
    }

    #[test]
    fn test_not_available_is_absent_not_zero() {
        let content = dataset(&[
            "1,Quiet,Drama,Slow.,Some Director,Some Actor,2016,90,6.1,100,N/A,N/A",
            "2,Loud,Drama,Fast.,Some Director,Some Actor,2016,90,6.1,100,0.0,0",
        ]);

        let rows = parse_dataset(&content).unwrap();
        assert_eq!(rows[0].revenue, None);
        assert_eq!(rows[0].metascore, None);
        assert_eq!(rows[1].revenue, Some(0.0));
        assert_eq!(rows[1].metascore, Some(0));
    }

    #[test]
    fn test_byte_order_mark_ignored() {
        let content = format!(
            "\u{feff}{}",
            dataset(&["1,Split,Horror,Three girls.,M. Night Shyamalan,James McAvoy,2016,117,7.3,157606,138.12,62"])
        );
        let rows = parse_dataset(&content).unwrap();
        assert_eq!(rows[0].title, "Split");
    }

    #[test]
    fn test_bad_number_reports_row() {
        let content = dataset(&[
            "1,Split,Horror,Three girls.,M. Night Shyamalan,James McAvoy,2016,117,7.3,157606,138.12,62",
            "2,Sing,Animation,Koalas.,Christophe Lourdelet,Matthew McConaughey,2016,long,7.2,60545,270.32,59",
        ]);

        match parse_dataset(&content) {
            Err(Error::Ingestion { row, message }) => {
                assert_eq!(row, Some(3));
                assert!(message.contains("runtime"), "message: {}", message);
            }
            other => panic!("expected ingestion error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_wrong_column_count_reports_row() {
        let content = dataset(&["1,Split,Horror"]);
        match parse_dataset(&content) {
            Err(Error::Ingestion { row, message }) => {
                assert_eq!(row, Some(2));
                assert!(message.contains("columns"));
            }
            other => panic!("expected ingestion error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_empty_title_is_fatal() {
        let content = dataset(&[",,Horror,Nothing.,Nobody,Someone,2016,90,5.0,10,N/A,N/A"]);
        assert!(matches!(
            parse_dataset(&content),
            Err(Error::Ingestion { row: Some(2), .. })
        ));
    }

    #[test]
    fn test_missing_file_is_ingestion_error() {
        let result = read_dataset(Path::new("/nonexistent/movies.csv"));
        assert!(matches!(result, Err(Error::Ingestion { row: None, .. })));
    }

    #[test]
    fn test_shared_names_deduplicated() {
        let content = dataset(&[
            r#"1,Cast Away,"Adventure,Drama",Stranded.,Robert Zemeckis,"Tom Hanks, Helen Hunt",2000,143,7.8,500000,233.63,73"#,
            r#"2,Sully,"Biography,Drama",Landing.,Clint Eastwood,"Tom Hanks,Aaron Eckhart",2016,96,7.5,137608,125.07,74"#,
            r#"3,Forrest Gump,"Drama,Romance",Life.,Robert Zemeckis,"Tom Hanks, Robin Wright",1994,142,8.8,1700000,330.25,82"#,
        ]);

        let catalogue = Catalogue::from_rows(parse_dataset(&content).unwrap()).unwrap();

        assert_eq!(catalogue.movies().len(), 3);
        assert_eq!(
            catalogue.actors().iter().filter(|a| a.name() == "Tom Hanks").count(),
            1
        );
        assert_eq!(catalogue.actors().len(), 4);
        assert_eq!(catalogue.directors().len(), 2);
        assert_eq!(catalogue.genres().len(), 4);

        for title in ["Cast Away", "Sully", "Forrest Gump"] {
            assert!(catalogue.movie(title).unwrap().has_actor("Tom Hanks"));
        }
        assert!(catalogue.director("Robert Zemeckis").is_some());
    }

    #[test]
    fn test_repeated_title_merges_links() {
        let content = dataset(&[
            "1,Split,Horror,First.,M. Night Shyamalan,James McAvoy,2016,117,7.3,157606,138.12,62",
            r#"2,Split,"Horror,Thriller",Second.,M. Night Shyamalan,"James McAvoy, Anya Taylor-Joy",2016,117,7.3,157606,138.12,62"#,
        ]);

        let catalogue = Catalogue::from_rows(parse_dataset(&content).unwrap()).unwrap();
        let movie = catalogue.movie("Split").unwrap();

        assert_eq!(catalogue.movies().len(), 1);
        assert_eq!(movie.description, "First.");
        assert_eq!(movie.actors(), ["James McAvoy", "Anya Taylor-Joy"]);
        assert_eq!(movie.genres(), ["Horror", "Thriller"]);
    }

    #[test]
    fn test_repeated_title_keeps_first_director_only() {
        let content = dataset(&[
            "1,Split,Horror,First.,M. Night Shyamalan,James McAvoy,2016,117,7.3,157606,138.12,62",
            "2,Split,Thriller,Second.,Someone Else,Anya Taylor-Joy,2016,117,7.3,157606,138.12,62",
        ]);

        let catalogue = Catalogue::from_rows(parse_dataset(&content).unwrap()).unwrap();

        assert_eq!(catalogue.directors().len(), 1);
        assert!(catalogue.director("Someone Else").is_none());
        assert!(catalogue.movie("Split").unwrap().is_directed_by("M. Night Shyamalan"));
    }

    #[test]
    fn test_empty_fragments_skipped() {
        assert_eq!(split_names("Action, ,Sci-Fi,"), vec!["Action", "Sci-Fi"]);
        assert!(split_names("").is_empty());
    }
}
