//! digiKam tag forest flattened into fully-qualified names.
//!
//! Tags are stored as a parent-pointer table. [`TagTree`] indexes it once
//! into an id map plus a parent → children adjacency list, so traversal
//! order is explicit and the rows themselves are never touched again.

use std::collections::{HashMap, HashSet};

use crate::db::Tag;

/// `Tags.pid` of a top-level tag
pub const ROOT_PARENT_ID: i64 = 0;

/// Joins ancestor names in a fully-qualified tag name
pub const SEPARATOR: &str = "/";

/// Root of digiKam's bookkeeping subtree (color/pick labels, versioning).
/// It and everything below it are hidden from every listing.
pub const INTERNAL_TAGS_ROOT: &[&str] = &["_Digikam_Internal_Tags_"];

/// Bookkeeping tags hidden from aggregation output wherever they sit in the tree.
pub const BLACKLIST_TAGS: &[&str] = &[
    "Color Label None",
    "Pick Label None",
    "Current Version",
    "Original Version",
    "Intermediate Version",
    "Scanned for Faces",
];

pub fn is_blacklisted(name: &str) -> bool {
    BLACKLIST_TAGS.contains(&name)
}

fn is_internal_root(name: &str) -> bool {
    INTERNAL_TAGS_ROOT.contains(&name)
}

#[derive(Debug, Clone, Default)]
pub struct TagTree {
    tags: HashMap<i64, Tag>,
    children: HashMap<i64, Vec<i64>>,
}

impl TagTree {
    pub fn new(tags: Vec<Tag>) -> Self {
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for tag in &tags {
            if tag.id != tag.pid {
                children.entry(tag.pid).or_default().push(tag.id);
            }
        }
        let tags: HashMap<i64, Tag> = tags.into_iter().map(|t| (t.id, t)).collect();

        // Siblings by name, then id, so output does not depend on row order
        for ids in children.values_mut() {
            ids.sort_by(|a, b| {
                let name_a = tags.get(a).map(|t| t.name.as_str());
                let name_b = tags.get(b).map(|t| t.name.as_str());
                name_a.cmp(&name_b).then(a.cmp(b))
            });
        }

        Self { tags, children }
    }

    pub fn get(&self, id: i64) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Depth-first list of `(tag id, full name)` for every reachable tag.
    ///
    /// Root tags come first in name order, each followed by its subtree.
    /// Internal subtrees are skipped entirely.
    pub fn flatten(&self) -> Vec<(i64, String)> {
        let mut out = Vec::with_capacity(self.tags.len());
        let mut visited = HashSet::new();
        for &root in self.children_of(ROOT_PARENT_ID) {
            self.visit(root, None, &mut visited, &mut out);
        }
        out
    }

    fn visit(
        &self,
        id: i64,
        parent_name: Option<&str>,
        visited: &mut HashSet<i64>,
        out: &mut Vec<(i64, String)>,
    ) {
        let Some(tag) = self.tags.get(&id) else {
            return;
        };
        if is_internal_root(&tag.name) || !visited.insert(id) {
            return;
        }
        let name = match parent_name {
            Some(parent) => format!("{}{}{}", parent, SEPARATOR, tag.name),
            None => tag.name.clone(),
        };
        out.push((id, name.clone()));
        for &child in self.children_of(id) {
            self.visit(child, Some(name.as_str()), visited, out);
        }
    }

    fn children_of(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Full name of one tag, built by walking up its parent chain.
    ///
    /// Returns `None` for an unknown id. A parent id that does not resolve
    /// ends the walk; so does a repeated id.
    pub fn full_name(&self, id: i64) -> Option<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.tags.get(&id)?;
        loop {
            if !seen.insert(current.id) {
                break;
            }
            names.push(current.name.as_str());
            if current.pid == ROOT_PARENT_ID {
                break;
            }
            match self.tags.get(&current.pid) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        names.reverse();
        Some(names.join(SEPARATOR))
    }

    /// Whether the tag is, or descends from, an internal bookkeeping root.
    pub fn is_internal(&self, id: i64) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.tags.get(&id);
        while let Some(tag) = current {
            if is_internal_root(&tag.name) {
                return true;
            }
            if tag.pid == ROOT_PARENT_ID || !seen.insert(tag.id) {
                return false;
            }
            current = self.tags.get(&tag.pid);
        }
        false
    }
}
