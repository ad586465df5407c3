//! Row types read from the digiKam tables.

/// A row of the `Tags` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub pid: i64,
    pub name: String,
}

/// Where an image sits in the album hierarchy, as far as the store knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumLink {
    /// `Images.album` is NULL, or points to an album row that does not exist
    Missing { album_id: Option<i64> },
    /// The album exists but its root does not
    Rootless { album_id: i64, relative_path: String },
    Rooted { root_label: String, relative_path: String },
}

impl AlbumLink {
    /// Classify the outer-joined album and root columns of a row.
    pub fn from_columns(
        image_album: Option<i64>,
        album_id: Option<i64>,
        relative_path: Option<String>,
        root_id: Option<i64>,
        root_label: Option<String>,
    ) -> Self {
        match (album_id, relative_path) {
            (Some(album_id), Some(relative_path)) => match root_id {
                Some(_) => AlbumLink::Rooted {
                    root_label: root_label.unwrap_or_default(),
                    relative_path,
                },
                None => AlbumLink::Rootless { album_id, relative_path },
            },
            _ => AlbumLink::Missing { album_id: image_album },
        }
    }
}

/// One image carrying one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedImage {
    pub tag_id: i64,
    pub image_id: i64,
    pub name: String,
    pub album: AlbumLink,
}

/// Number of images in one album carrying one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumTagCount {
    pub album: AlbumLink,
    pub tag_id: i64,
    pub count: u64,
}

/// A table and its declared columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub decl_type: String,
}

/// Entity counts and on-disk size of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    pub location: String,
    pub size_bytes: Option<u64>,
    pub albums: i64,
    pub images: i64,
    pub tags: i64,
}
