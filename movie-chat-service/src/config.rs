use std::path::PathBuf;
use std::time::Duration;

/// Service configuration, read from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Artificial "typing" wait before each bot reply. Presentation only.
    pub typing_delay: Duration,
    /// Remote movie backend base URL; takes precedence over `catalog_file`.
    pub catalog_url: Option<String>,
    /// JSON file with wire-shape movie records.
    pub catalog_file: Option<PathBuf>,
    /// JSON file backing the watched-history store.
    pub watched_db: Option<PathBuf>,
    /// JSON file seeding the user profile store.
    pub profile_db: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let typing_delay_ms = std::env::var("TYPING_DELAY_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .unwrap_or(800);
        Self {
            port,
            typing_delay: Duration::from_millis(typing_delay_ms),
            catalog_url: std::env::var("CATALOG_URL").ok(),
            catalog_file: std::env::var("CATALOG_FILE").ok().map(PathBuf::from),
            watched_db: std::env::var("WATCHED_DB").ok().map(PathBuf::from),
            profile_db: std::env::var("PROFILE_DB").ok().map(PathBuf::from),
        }
    }
}
