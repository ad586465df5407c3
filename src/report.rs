//! Plain-text rendering of query results.

use std::collections::BTreeMap;
use std::fmt;

use crate::db::{DbStats, TableSchema};
use crate::query::tags::{AlbumBucket, TagEntry};
use crate::query::AlbumTags;

/// Album path without its leading `/`
fn display_path(relative_path: &str) -> &str {
    relative_path.strip_prefix('/').unwrap_or(relative_path)
}

/// Tag/count pairs, highest count first, ties by name.
fn by_count(tags: &BTreeMap<String, u64>) -> Vec<(&str, u64)> {
    let mut sorted: Vec<(&str, u64)> = tags.iter().map(|(t, c)| (t.as_str(), *c)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// Tags of each selected album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumReport {
    albums: AlbumTags,
}

impl AlbumReport {
    pub fn new(albums: AlbumTags) -> Self {
        Self { albums }
    }

    pub fn albums(&self) -> &AlbumTags {
        &self.albums
    }
}

impl fmt::Display for AlbumReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (album, tags) in &self.albums {
            writeln!(f, "{} ({})", display_path(album), tags.len())?;
            let line: Vec<String> = by_count(tags)
                .into_iter()
                .map(|(t, c)| format!("{} ({})", t, c))
                .collect();
            writeln!(f, "    {}", line.join(" "))?;
        }
        Ok(())
    }
}

/// How a [`TagReport`] is laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagLayout {
    /// A root filter is active, so album roots are not printed
    pub root_filtered: bool,
    pub sort_count: bool,
    pub show_images: bool,
    /// Co-tags one per line with full names, instead of inline
    pub full_tagname: bool,
    pub cross_filter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReport {
    entries: Vec<TagEntry>,
    layout: TagLayout,
}

impl TagReport {
    pub fn new(entries: Vec<TagEntry>, layout: TagLayout) -> Self {
        Self { entries, layout }
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    fn write_bucket(&self, f: &mut fmt::Formatter<'_>, bucket: &AlbumBucket) -> fmt::Result {
        let count = if self.layout.sort_count {
            format!("{:3}", bucket.images.len())
        } else {
            "   ".to_string()
        };
        if self.layout.root_filtered {
            writeln!(f, "    {} {}", count, display_path(&bucket.relative_path))?;
        } else {
            writeln!(f, "    {} {} {}", count, bucket.root_label, display_path(&bucket.relative_path))?;
        }

        if self.layout.cross_filter && !bucket.co_tags.is_empty() {
            if self.layout.full_tagname {
                for (tag, n) in &bucket.co_tags {
                    writeln!(f, "         {:3} {}", n, tag)?;
                }
            } else {
                let line: Vec<String> = bucket
                    .co_tags
                    .iter()
                    .map(|(t, c)| format!("{} ({})", t, c))
                    .collect();
                writeln!(f, "            {}", line.join(" "))?;
            }
        }

        if self.layout.show_images {
            for name in &bucket.images {
                writeln!(f, "            {}", name)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TagReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{:3} {}", entry.albums.len(), entry.full_name)?;
            for bucket in &entry.albums {
                self.write_bucket(f, bucket)?;
            }
        }
        Ok(())
    }
}

/// Tables and columns of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    tables: Vec<TableSchema>,
}

impl SchemaReport {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "database schema :")?;
        for table in &self.tables {
            write!(f, "\n- {}\n", table.name)?;
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|c| format!("{}.{} {}", table.name, c.name, c.decl_type))
                .collect();
            write!(f, "{}", columns.join("\n"))?;
        }
        Ok(())
    }
}

impl fmt::Display for DbStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = match self.size_bytes {
            Some(bytes) => format!("{:.2}MB", bytes as f64 / 1_000_000.0),
            None => "N/A".to_string(),
        };
        writeln!(f, "database {}", self.location)?;
        writeln!(f, "    size {}", size)?;
        writeln!(f, "  albums {}", self.albums)?;
        writeln!(f, "  images {}", self.images)?;
        write!(f, "    tags {}", self.tags)
    }
}
