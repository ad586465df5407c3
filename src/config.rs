use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::query::{QueryOptions, TagFilter, WILDCARD};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// `sqlite:///path` URI or plain path of the digiKam database
    #[serde(default = "default_database")]
    pub database: String,

    /// Restrict queries to the album root with this label (empty = all roots)
    #[serde(default)]
    pub root: Option<String>,

    /// Pattern for co-occurring tags shown by `tag`; empty disables them
    #[serde(default = "default_filter_tags")]
    pub filter_tags: Option<String>,

    /// Show full tag names (`Places/Paris`) instead of bare names
    #[serde(default)]
    pub full_tagname: bool,

    /// Also write logs to a daily rolling file in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_database() -> String {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    format!("sqlite:///{}", home.join("Pictures").join("digikam4.db").display())
}

fn default_filter_tags() -> Option<String> {
    Some(WILDCARD.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            root: None,
            filter_tags: default_filter_tags(),
            full_tagname: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Config file to read: `DIGIKUERY_CONFIG` or the default location.
    pub fn path() -> PathBuf {
        std::env::var_os("DIGIKUERY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path)
    }

    /// Load from `path`, or `None` when no file exists there.
    ///
    /// Runs before logging is set up, so the caller reports the fallback.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load_from(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| Error::ConfigRead { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse { path: path.to_path_buf(), source })
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("digikuery")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolve the run-wide query options. Fails on an invalid tag pattern.
    pub fn query_options(&self) -> Result<QueryOptions> {
        Ok(QueryOptions {
            root: self.root.clone().filter(|r| !r.is_empty()),
            filter_tags: TagFilter::parse(self.filter_tags.as_deref())?,
            full_tagname: self.full_tagname,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.database.starts_with("sqlite:///"));
        assert!(config.database.ends_with("digikam4.db"));
        assert_eq!(config.filter_tags.as_deref(), Some(".*"));

        let options = config.query_options().unwrap();
        assert_eq!(options.root, None);
        assert!(matches!(options.filter_tags, TagFilter::ShowAll));
        assert!(!options.full_tagname);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "root = \"home\"\nfull_tagname = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.root.as_deref(), Some("home"));
        assert!(config.full_tagname);
        assert_eq!(config.filter_tags.as_deref(), Some(".*"));
        assert_eq!(config.database, default_database());
    }

    #[test]
    fn test_missing_file_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        assert_eq!(Config::load_if_exists(&missing).unwrap(), None);

        std::fs::write(&missing, "root = \"nas\"\n").unwrap();
        let config = Config::load_if_exists(&missing).unwrap().unwrap();
        assert_eq!(config.root.as_deref(), Some("nas"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "full_tagname = \"maybe\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_empty_values_disable_filters() {
        let config = Config {
            root: Some(String::new()),
            filter_tags: Some(String::new()),
            ..Default::default()
        };
        let options = config.query_options().unwrap();
        assert_eq!(options.root, None);
        assert!(!options.filter_tags.is_enabled());
    }
}
