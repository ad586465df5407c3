//! Album aggregation: image counts per tag for a set of albums.

use std::collections::BTreeMap;

use tracing::warn;

use super::TagFilter;
use crate::db::{AlbumLink, AlbumTagCount};
use crate::tags::{is_blacklisted, TagTree};

/// album relative path → tag key → image count
pub type AlbumTags = BTreeMap<String, BTreeMap<String, u64>>;

/// Fold grouped (album, tag) rows into per-album tag counts.
///
/// Rows whose images have no album, or whose album has no root, are logged
/// and dropped. Bookkeeping tags and the internal subtree never appear.
/// `skiptag` is compared against both the bare and the full tag name;
/// `filter`, when given, keeps only tags whose full name it matches.
pub fn aggregate(
    rows: &[AlbumTagCount],
    tree: &TagTree,
    skiptag: Option<&str>,
    filter: Option<&TagFilter>,
    full_tagname: bool,
) -> AlbumTags {
    let mut albums = AlbumTags::new();

    for row in rows {
        let Some(tag) = tree.get(row.tag_id) else {
            warn!(tag_id = row.tag_id, images = row.count, "Images reference an unknown tag");
            continue;
        };
        if is_blacklisted(&tag.name) || tree.is_internal(tag.id) {
            continue;
        }
        let relative_path = match &row.album {
            AlbumLink::Rooted { relative_path, .. } => relative_path,
            AlbumLink::Rootless { album_id, relative_path } => {
                warn!(
                    tag = %tag.name,
                    images = row.count,
                    album = %relative_path,
                    album_id,
                    "Album has no album root, skipping"
                );
                continue;
            }
            AlbumLink::Missing { album_id } => {
                warn!(tag = %tag.name, images = row.count, album_id = ?album_id, "Images have no album, skipping");
                continue;
            }
        };

        let full_name = tree.full_name(tag.id).unwrap_or_else(|| tag.name.clone());
        if skiptag.is_some_and(|skip| skip == tag.name || skip == full_name) {
            continue;
        }
        if filter.is_some_and(|f| !f.matches(&full_name)) {
            continue;
        }

        let key = if full_tagname { full_name } else { tag.name.clone() };
        *albums
            .entry(relative_path.clone())
            .or_default()
            .entry(key)
            .or_default() += row.count;
    }

    albums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Tag;

    fn tree() -> TagTree {
        TagTree::new(vec![
            Tag { id: 1, pid: 0, name: "Places".into() },
            Tag { id: 2, pid: 1, name: "Paris".into() },
            Tag { id: 3, pid: 0, name: "Current Version".into() },
            Tag { id: 4, pid: 0, name: "Flowers".into() },
        ])
    }

    fn rooted(path: &str, tag_id: i64, count: u64) -> AlbumTagCount {
        AlbumTagCount {
            album: AlbumLink::Rooted { root_label: "home".into(), relative_path: path.into() },
            tag_id,
            count,
        }
    }

    #[test]
    fn test_aggregate_counts_and_blacklist() {
        let rows = vec![rooted("/a", 2, 3), rooted("/a", 3, 9), rooted("/b", 4, 1)];
        let albums = aggregate(&rows, &tree(), None, None, false);

        assert_eq!(albums.len(), 2);
        assert_eq!(albums["/a"].get("Paris"), Some(&3));
        assert!(!albums["/a"].contains_key("Current Version"));
        assert_eq!(albums["/b"].get("Flowers"), Some(&1));
    }

    #[test]
    fn test_aggregate_skips_broken_rows() {
        let rows = vec![
            AlbumTagCount { album: AlbumLink::Missing { album_id: None }, tag_id: 2, count: 4 },
            AlbumTagCount {
                album: AlbumLink::Rootless { album_id: 7, relative_path: "/lost".into() },
                tag_id: 2,
                count: 1,
            },
            rooted("/a", 2, 1),
        ];
        let albums = aggregate(&rows, &tree(), None, None, false);
        let keys: Vec<&str> = albums.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/a"]);
        assert_eq!(albums["/a"]["Paris"], 1);
    }

    #[test]
    fn test_aggregate_skiptag_by_full_name() {
        let rows = vec![rooted("/a", 2, 3), rooted("/a", 4, 2)];
        let albums = aggregate(&rows, &tree(), Some("Places/Paris"), None, true);
        assert_eq!(albums["/a"].keys().collect::<Vec<_>>(), vec!["Flowers"]);
    }

    #[test]
    fn test_aggregate_filter_matches_full_name() {
        let rows = vec![rooted("/a", 2, 3), rooted("/a", 4, 2)];
        let filter = TagFilter::parse(Some("^places")).unwrap();
        let albums = aggregate(&rows, &tree(), None, Some(&filter), false);
        assert_eq!(albums["/a"].keys().collect::<Vec<_>>(), vec!["Paris"]);
    }
}
