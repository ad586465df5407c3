//! Reports over a digiKam photo database: album tags, tag usage across
//! albums, co-occurring tags, schema and statistics.
//!
//! The store is only ever read. See [`query::Digikuery`] for the entry point.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod report;
pub mod tags;

pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use query::{Digikuery, QueryOptions, TagFilter};
