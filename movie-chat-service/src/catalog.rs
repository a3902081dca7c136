//! Movie catalog: the canonical `Movie` record and the sources it is fetched
//! from. Records are normalized once at the fetch boundary and never mutated
//! afterwards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog payload malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A movie as the rest of the system sees it. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Canonical English genre labels, in catalog order.
    pub genres: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub watched: Option<bool>,
    #[serde(default)]
    pub adult: bool,
}

/// The backend wire shape, as served by the movie API.
#[derive(Debug, Deserialize)]
struct WireMovie {
    movie_id: i64,
    title: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    poster_url: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    popular: bool,
    #[serde(default)]
    adult: bool,
}

impl From<WireMovie> for Movie {
    fn from(wire: WireMovie) -> Self {
        let year = wire
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok());
        Movie {
            id: wire.movie_id,
            title: wire.title,
            genres: wire.genres,
            year,
            rating: wire.vote_average,
            popularity: wire.popularity,
            poster: wire.poster_url.unwrap_or_default(),
            description: wire.overview.unwrap_or_default(),
            popular: wire.popular,
            watched: Some(false),
            adult: wire.adult,
        }
    }
}

/// Anything that can produce the full movie catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Movie>, CatalogError>;
}

/// Fetches and normalizes the catalog from the movie backend.
pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Vec<Movie>, CatalogError> {
        let url = format!("{}/movies", self.base_url.trim_end_matches('/'));
        let wire: Vec<WireMovie> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(count = wire.len(), "fetched movie catalog");
        Ok(wire.into_iter().map(Movie::from).collect())
    }
}

/// A fixed in-memory catalog, loaded at startup or handed in by tests.
pub struct StaticCatalog {
    movies: Vec<Movie>,
}

impl StaticCatalog {
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    pub fn empty() -> Self {
        Self { movies: Vec::new() }
    }

    /// Load a JSON file holding an array of wire-shape movie records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let wire: Vec<WireMovie> = serde_json::from_str(&raw)?;
        Ok(Self {
            movies: wire.into_iter().map(Movie::from).collect(),
        })
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch(&self) -> Result<Vec<Movie>, CatalogError> {
        Ok(self.movies.clone())
    }
}
