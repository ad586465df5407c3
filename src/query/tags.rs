//! Tag aggregation: albums holding the images of each tag.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use tracing::warn;

use super::AlbumTags;
use crate::db::{AlbumLink, TaggedImage};
use crate::tags::{is_blacklisted, TagTree};

/// Images of one tag inside one album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumBucket {
    pub root_label: String,
    pub relative_path: String,
    /// Image names, in store order
    pub images: Vec<String>,
    /// Other tags present in the album, highest count first
    pub co_tags: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub tag_id: i64,
    pub full_name: String,
    pub albums: Vec<AlbumBucket>,
}

/// Bucket every tag's images by (root label, album path).
///
/// Tags are taken in flattening order and kept only if `pattern` matches
/// their full name and at least one image landed in a bucket. Buckets are
/// ordered by root then path, or by image count when `sort_count` is set.
/// Entries come back ordered by album count, ties in flattening order.
pub fn aggregate(
    tree: &TagTree,
    images: &[TaggedImage],
    pattern: Option<&Regex>,
    sort_count: bool,
) -> Vec<TagEntry> {
    let mut by_tag: HashMap<i64, Vec<&TaggedImage>> = HashMap::new();
    for image in images {
        by_tag.entry(image.tag_id).or_default().push(image);
    }

    let mut entries = Vec::new();
    for (tag_id, full_name) in tree.flatten() {
        if pattern.is_some_and(|re| !re.is_match(&full_name)) {
            continue;
        }
        if tree.get(tag_id).is_some_and(|t| is_blacklisted(&t.name)) {
            continue;
        }

        let mut buckets: BTreeMap<(&str, &str), Vec<String>> = BTreeMap::new();
        for image in by_tag.get(&tag_id).map(Vec::as_slice).unwrap_or(&[]) {
            match &image.album {
                AlbumLink::Rooted { root_label, relative_path } => {
                    buckets
                        .entry((root_label.as_str(), relative_path.as_str()))
                        .or_default()
                        .push(image.name.clone());
                }
                AlbumLink::Rootless { album_id, relative_path } => {
                    warn!(
                        tag = %full_name,
                        image = %image.name,
                        album = %relative_path,
                        album_id,
                        "Album has no album root, skipping image"
                    );
                }
                AlbumLink::Missing { album_id } => {
                    warn!(tag = %full_name, image = %image.name, album_id = ?album_id, "Image has no album, skipping");
                }
            }
        }
        if buckets.is_empty() {
            continue;
        }

        let mut albums: Vec<AlbumBucket> = buckets
            .into_iter()
            .map(|((root_label, relative_path), images)| AlbumBucket {
                root_label: root_label.to_string(),
                relative_path: relative_path.to_string(),
                images,
                co_tags: Vec::new(),
            })
            .collect();
        if sort_count {
            albums.sort_by(|a, b| b.images.len().cmp(&a.images.len()));
        }
        entries.push(TagEntry { tag_id, full_name, albums });
    }

    entries.sort_by(|a, b| b.albums.len().cmp(&a.albums.len()));
    entries
}

/// Copy the co-occurring tags of each bucket's album from a cross-filter pass.
pub fn attach_co_tags(entry: &mut TagEntry, co_tags: &AlbumTags) {
    for bucket in &mut entry.albums {
        let Some(tags) = co_tags.get(&bucket.relative_path) else {
            continue;
        };
        let mut sorted: Vec<(String, u64)> = tags.iter().map(|(t, c)| (t.clone(), *c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        bucket.co_tags = sorted;
    }
}
