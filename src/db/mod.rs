//! Read-only access to a digiKam database.

mod schema;
pub mod models;
pub mod sqlite;

use rusqlite::Connection;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub use models::{AlbumLink, AlbumTagCount, ColumnSchema, DbStats, TableSchema, Tag, TaggedImage};
pub use schema::{DIGIKAM_SCHEMA, REQUIRED_TABLES};

/// Where the store lives, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    /// Parse `sqlite:///path`, `sqlite://` (in memory) or a bare path.
    ///
    /// The `sqlite:///` prefix follows the SQLAlchemy convention, so an
    /// absolute path takes four slashes: `sqlite:////home/me/digikam4.db`.
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(rest) = uri.strip_prefix("sqlite://") {
            let path = rest.strip_prefix('/').unwrap_or(rest);
            return Ok(match path {
                "" | ":memory:" => Location::Memory,
                path => Location::File(PathBuf::from(path)),
            });
        }
        if uri.contains("://") {
            return Err(Error::UnsupportedUri(uri.to_string()));
        }
        Ok(Location::File(PathBuf::from(uri)))
    }
}

pub struct Database {
    uri: String,
    location: Location,
    inner: sqlite::SqliteDb,
}

impl Database {
    /// Open the store read-only and check it carries the digiKam tables.
    pub fn open(uri: &str) -> Result<Self> {
        let location = Location::parse(uri)?;
        let inner = match &location {
            Location::File(path) => {
                if !path.is_file() {
                    return Err(Error::DatabaseNotFound(path.clone()));
                }
                sqlite::SqliteDb::open_read_only(path)?
            }
            Location::Memory => sqlite::SqliteDb::new(Connection::open_in_memory()?),
        };
        inner.verify_tables()?;
        tracing::debug!(uri, "Database opened");
        Ok(Self { uri: uri.to_string(), location, inner })
    }

    /// Wrap an already open connection, used to query fixtures built in memory.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let inner = sqlite::SqliteDb::new(conn);
        inner.verify_tables()?;
        Ok(Self {
            uri: "sqlite://".to_string(),
            location: Location::Memory,
            inner,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn tags(&self) -> Result<Vec<Tag>> {
        self.inner.get_all_tags()
    }

    pub fn album_tag_counts(
        &self,
        selection: &AlbumSelection,
        root: Option<&str>,
    ) -> Result<Vec<AlbumTagCount>> {
        self.inner.get_album_tag_counts(selection, root)
    }

    pub fn tagged_images(&self, root: Option<&str>) -> Result<Vec<TaggedImage>> {
        self.inner.get_tagged_images(root)
    }

    pub fn schema(&self) -> Result<Vec<TableSchema>> {
        self.inner.get_tables()
    }

    pub fn stats(&self) -> Result<DbStats> {
        let size_bytes = match &self.location {
            Location::File(path) => Some(std::fs::metadata(path)?.len()),
            Location::Memory => None,
        };
        Ok(DbStats {
            location: self.uri.clone(),
            size_bytes,
            albums: self.inner.count_rows("Albums")?,
            images: self.inner.count_rows("Images")?,
            tags: self.inner.count_rows("Tags")?,
        })
    }
}

/// Which albums an aggregation looks at, pushed down into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumSelection {
    All,
    /// `relativePath LIKE '%pattern%'`, with the store's own LIKE semantics
    Like(String),
    /// `relativePath IN (...)`
    Exact(Vec<String>),
}
