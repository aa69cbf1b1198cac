use std::path::{Path, PathBuf};
use std::time::Duration;

const URL_SCHEME: &str = "sqlite://";
const MEMORY_URL: &str = "sqlite::memory:";

/// SQLite connection configuration
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file, `None` for a private in-memory database
    pub path: Option<PathBuf>,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,

    /// Open the database read-only
    pub read_only: bool,

    /// Enforce foreign key constraints
    pub foreign_keys: bool,
}

impl SqliteConfig {
    /// Configuration for a database file, created on first open
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::memory()
        }
    }

    /// Configuration for a private in-memory database
    ///
    /// Every connection opened from it sees its own empty database.
    pub fn memory() -> Self {
        Self {
            path: None,
            busy_timeout: Duration::from_secs(5),
            read_only: false,
            foreign_keys: true,
        }
    }

    /// Set busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Open read-only
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Enable or disable foreign key enforcement
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Parse from connection string
    ///
    /// Format: "sqlite://path/to/file.db" or "sqlite::memory:"
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = SqliteConfig::from_url("sqlite:///var/lib/app/app.db")?;
    /// ```
    pub fn from_url(url: &str) -> Result<Self, String> {
        if url == MEMORY_URL {
            return Ok(Self::memory());
        }

        let path = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| format!("URL must start with '{}'", URL_SCHEME))?;

        if path.is_empty() {
            return Err("Database path cannot be empty".to_string());
        }

        Ok(Self::new(path))
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        match &self.path {
            Some(path) => format!("{}{}", URL_SCHEME, path.display()),
            None => MEMORY_URL.to_string(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err("Database path cannot be empty".to_string());
            }
        } else if self.read_only {
            return Err("An in-memory database cannot be read-only".to_string());
        }

        Ok(())
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SqliteConfig::default();
        assert!(config.path.is_none());
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(config.foreign_keys);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SqliteConfig::new("app.db")
            .busy_timeout(Duration::from_millis(250))
            .read_only(true)
            .foreign_keys(false);

        assert_eq!(config.path.as_deref(), Some(Path::new("app.db")));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(config.read_only);
        assert!(!config.foreign_keys);
    }

    #[test]
    fn test_from_url() {
        let config = SqliteConfig::from_url("sqlite:///var/lib/app/app.db").unwrap();
        assert_eq!(config.path.as_deref(), Some(Path::new("/var/lib/app/app.db")));

        let memory = SqliteConfig::from_url("sqlite::memory:").unwrap();
        assert!(memory.path.is_none());
    }

    #[test]
    fn test_invalid_url() {
        assert!(SqliteConfig::from_url("postgres://localhost/db").is_err());
        assert!(SqliteConfig::from_url("sqlite://").is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let config = SqliteConfig::new("data/app.db");
        assert_eq!(config.to_url(), "sqlite://data/app.db");
        assert_eq!(SqliteConfig::memory().to_url(), "sqlite::memory:");
    }

    #[test]
    fn test_validate() {
        assert!(SqliteConfig::new("app.db").validate().is_ok());
        assert!(SqliteConfig::new("").validate().is_err());
        assert!(SqliteConfig::memory().read_only(true).validate().is_err());
    }
}
