/// Tables the query engine reads. A store missing any of them is rejected.
pub const REQUIRED_TABLES: &[&str] = &["AlbumRoots", "Albums", "Images", "ImageTags", "Tags"];

/// The subset of the digiKam schema read by this tool.
///
/// digiKam owns the real schema; this copy only exists to build fixtures.
pub const DIGIKAM_SCHEMA: &str = r#"
-- Collection locations (one per drive / network share)
CREATE TABLE IF NOT EXISTS AlbumRoots (
    id INTEGER PRIMARY KEY,
    label TEXT,
    status INTEGER NOT NULL DEFAULT 0,
    type INTEGER NOT NULL DEFAULT 1,
    identifier TEXT,
    specificPath TEXT,
    UNIQUE(identifier, specificPath)
);

-- Folders relative to a root
CREATE TABLE IF NOT EXISTS Albums (
    id INTEGER PRIMARY KEY,
    albumRoot INTEGER NOT NULL,
    relativePath TEXT NOT NULL,
    date DATE,
    caption TEXT,
    collection TEXT,
    icon INTEGER,
    UNIQUE(albumRoot, relativePath)
);

CREATE TABLE IF NOT EXISTS Images (
    id INTEGER PRIMARY KEY,
    album INTEGER,
    name TEXT NOT NULL,
    status INTEGER NOT NULL DEFAULT 1,
    category INTEGER NOT NULL DEFAULT 1,
    modificationDate DATETIME,
    fileSize INTEGER,
    uniqueHash TEXT,
    UNIQUE(album, name)
);

-- Tag forest; top-level tags have pid = 0
CREATE TABLE IF NOT EXISTS Tags (
    id INTEGER PRIMARY KEY,
    pid INTEGER,
    name TEXT NOT NULL,
    icon INTEGER,
    iconkde TEXT,
    UNIQUE(name, pid)
);

CREATE TABLE IF NOT EXISTS ImageTags (
    imageid INTEGER NOT NULL,
    tagid INTEGER NOT NULL,
    UNIQUE(imageid, tagid)
);

CREATE INDEX IF NOT EXISTS dir_index ON Images(album);
CREATE INDEX IF NOT EXISTS tag_index ON ImageTags(tagid);
CREATE INDEX IF NOT EXISTS tag_id_index ON ImageTags(imageid);
"#;
