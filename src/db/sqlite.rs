//! SQLite queries against the digiKam tables.

use rusqlite::{Connection, OpenFlags};
use std::collections::HashSet;
use std::path::Path;

use super::models::{AlbumLink, AlbumTagCount, ColumnSchema, TableSchema, Tag, TaggedImage};
use super::schema::REQUIRED_TABLES;
use super::AlbumSelection;
use crate::error::{Error, Result};

pub struct SqliteDb {
    pub(crate) conn: Connection,
}

impl SqliteDb {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn verify_tables(&self) -> Result<()> {
        let mut stmt = self.conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        for required in REQUIRED_TABLES {
            if !tables.contains(*required) {
                return Err(Error::MissingTable(required.to_string()));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub fn get_all_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare("SELECT id, COALESCE(pid, 0), name FROM Tags ORDER BY id")?;
        let tags = stmt
            .query_map([], |row| Ok(Tag { id: row.get(0)?, pid: row.get(1)?, name: row.get(2)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    // ========================================================================
    // Aggregation rows
    // ========================================================================

    /// Images per (album, tag), restricted to an album selection and root label.
    ///
    /// Albums and roots are outer-joined so rows with a dangling album or root
    /// come back as `AlbumLink::Missing` / `AlbumLink::Rootless` instead of
    /// silently disappearing. The root filter lets those rows through.
    pub fn get_album_tag_counts(
        &self,
        selection: &AlbumSelection,
        root: Option<&str>,
    ) -> Result<Vec<AlbumTagCount>> {
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(root.map(str::to_string))];
        let selection_clause = match selection {
            AlbumSelection::All => String::new(),
            AlbumSelection::Like(pattern) => {
                params_vec.push(Box::new(format!("%{}%", pattern)));
                "AND a.relativePath LIKE ?".to_string()
            }
            AlbumSelection::Exact(paths) => {
                if paths.is_empty() {
                    return Ok(vec![]);
                }
                let placeholders: Vec<&str> = paths.iter().map(|_| "?").collect();
                for path in paths.iter() {
                    params_vec.push(Box::new(path.clone()));
                }
                format!("AND a.relativePath IN ({})", placeholders.join(","))
            }
        };
        let query = format!(
            r#"
            SELECT i.album, a.id, a.relativePath, r.id, r.label, it.tagid, COUNT(i.id)
            FROM ImageTags it
            JOIN Images i ON i.id = it.imageid
            LEFT JOIN Albums a ON a.id = i.album
            LEFT JOIN AlbumRoots r ON r.id = a.albumRoot
            WHERE (?1 IS NULL OR a.id IS NULL OR r.id IS NULL OR r.label = ?1)
            {}
            GROUP BY i.album, it.tagid
            ORDER BY a.relativePath, it.tagid
            "#,
            selection_clause
        );
        let mut stmt = self.conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok(AlbumTagCount {
                    album: AlbumLink::from_columns(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?),
                    tag_id: row.get(5)?,
                    count: row.get::<_, i64>(6)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every (tag, image) pairing with the image's album and root.
    pub fn get_tagged_images(&self, root: Option<&str>) -> Result<Vec<TaggedImage>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT it.tagid, i.id, i.name, i.album, a.id, a.relativePath, r.id, r.label
            FROM ImageTags it
            JOIN Images i ON i.id = it.imageid
            LEFT JOIN Albums a ON a.id = i.album
            LEFT JOIN AlbumRoots r ON r.id = a.albumRoot
            WHERE (?1 IS NULL OR a.id IS NULL OR r.id IS NULL OR r.label = ?1)
            ORDER BY it.tagid, i.id
            "#,
        )?;
        let rows = stmt
            .query_map([root], |row| {
                Ok(TaggedImage {
                    tag_id: row.get(0)?,
                    image_id: row.get(1)?,
                    name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    album: AlbumLink::from_columns(row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========================================================================
    // Schema and statistics
    // ========================================================================

    pub fn get_tables(&self) -> Result<Vec<TableSchema>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut column_stmt = self.conn.prepare("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = column_stmt
                .query_map([&name], |row| {
                    Ok(ColumnSchema { name: row.get(0)?, decl_type: row.get(1)? })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            tables.push(TableSchema { name, columns });
        }
        Ok(tables)
    }

    /// Row count of one of the known tables.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        if !REQUIRED_TABLES.contains(&table) {
            return Err(Error::MissingTable(table.to_string()));
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}
