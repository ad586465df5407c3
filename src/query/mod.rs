//! Album and tag aggregation over a digiKam database.
//!
//! [`Digikuery`] holds the open store and the run-wide options. Each query
//! reloads the tag forest, fetches the joined rows it needs in one go and
//! hands them to the pure aggregation functions in [`albums`] and [`tags`].

pub mod albums;
pub mod tags;

use regex::{Regex, RegexBuilder};

use crate::db::{Database, DbStats};
use crate::error::{Error, Result};
use crate::report::{AlbumReport, SchemaReport, TagLayout, TagReport};
use crate::tags::TagTree;

pub use crate::db::AlbumSelection;
pub use albums::AlbumTags;

/// Pattern meaning "everything"
pub const WILDCARD: &str = ".*";

/// Compile a user pattern the way every listing matches it: a
/// case-insensitive regular expression that may match anywhere in the name.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::InvalidPattern { pattern: pattern.to_string(), source })
}

/// Co-occurring tag display for `query_tag`.
#[derive(Debug, Clone, Default)]
pub enum TagFilter {
    /// No co-tag detail at all
    Disabled,
    /// Show every co-occurring tag
    #[default]
    ShowAll,
    /// Show co-occurring tags whose full name matches
    Pattern(Regex),
}

impl TagFilter {
    /// `None` or an empty pattern disables the filter, `.*` shows everything.
    pub fn parse(pattern: Option<&str>) -> Result<Self> {
        match pattern {
            None | Some("") => Ok(TagFilter::Disabled),
            Some(WILDCARD) => Ok(TagFilter::ShowAll),
            Some(pattern) => Ok(TagFilter::Pattern(compile_pattern(pattern)?)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, TagFilter::Disabled)
    }

    pub fn matches(&self, full_name: &str) -> bool {
        match self {
            TagFilter::Disabled | TagFilter::ShowAll => true,
            TagFilter::Pattern(re) => re.is_match(full_name),
        }
    }
}

/// Options fixed for the whole run.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Only look at albums under the root with this label
    pub root: Option<String>,
    pub filter_tags: TagFilter,
    /// Key album tags by full name instead of bare name
    pub full_tagname: bool,
}

pub struct Digikuery {
    db: Database,
    options: QueryOptions,
}

impl Digikuery {
    pub fn new(db: Database, mut options: QueryOptions) -> Self {
        if options.root.as_deref() == Some("") {
            options.root = None;
        }
        Self { db, options }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    fn root(&self) -> Option<&str> {
        self.options.root.as_deref()
    }

    fn tag_tree(&self) -> Result<TagTree> {
        Ok(TagTree::new(self.db.tags()?))
    }

    /// Tags of one or all albums. `None` and `.*` both mean every album,
    /// anything else is a substring of the album path.
    pub fn query_album(&self, name: Option<&str>) -> Result<AlbumReport> {
        let selection = match name {
            None | Some(WILDCARD) => AlbumSelection::All,
            Some(name) => AlbumSelection::Like(name.to_string()),
        };
        let tree = self.tag_tree()?;
        let albums = self.query_albums(&tree, &selection, None)?;
        Ok(AlbumReport::new(albums))
    }

    /// Per (album, tag key) image counts for a selection of albums.
    ///
    /// `skiptag` drops the tag whose bare or full name equals it. The
    /// cross-filter pattern only applies to explicit album lists.
    pub fn query_albums(
        &self,
        tree: &TagTree,
        selection: &AlbumSelection,
        skiptag: Option<&str>,
    ) -> Result<AlbumTags> {
        let rows = self.db.album_tag_counts(selection, self.root())?;
        let filter = match selection {
            AlbumSelection::Exact(_) => Some(&self.options.filter_tags),
            _ => None,
        };
        Ok(albums::aggregate(&rows, tree, skiptag, filter, self.options.full_tagname))
    }

    /// Albums carrying each tag whose full name matches `pattern`.
    pub fn query_tag(
        &self,
        pattern: Option<&str>,
        show_images: bool,
        sort_count: bool,
    ) -> Result<TagReport> {
        let pattern = match pattern {
            None | Some("") | Some(WILDCARD) => None,
            Some(p) => Some(compile_pattern(p)?),
        };
        let tree = self.tag_tree()?;
        let images = self.db.tagged_images(self.root())?;
        let mut entries = tags::aggregate(&tree, &images, pattern.as_ref(), sort_count);

        if self.options.filter_tags.is_enabled() {
            for entry in &mut entries {
                let paths: Vec<String> = entry.albums.iter().map(|b| b.relative_path.clone()).collect();
                let co_tags = self.query_albums(&tree, &AlbumSelection::Exact(paths), Some(entry.full_name.as_str()))?;
                tags::attach_co_tags(entry, &co_tags);
            }
        }

        let layout = TagLayout {
            root_filtered: self.root().is_some(),
            sort_count,
            show_images,
            full_tagname: self.options.full_tagname,
            cross_filter: self.options.filter_tags.is_enabled(),
        };
        Ok(TagReport::new(entries, layout))
    }

    pub fn schema(&self) -> Result<SchemaReport> {
        Ok(SchemaReport::new(self.db.schema()?))
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.db.stats()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn engine(options: QueryOptions) -> Digikuery {
        Digikuery::new(fixtures::catalog(), options)
    }

    #[test]
    fn test_tag_filter_parse() {
        assert!(!TagFilter::parse(None).unwrap().is_enabled());
        assert!(!TagFilter::parse(Some("")).unwrap().is_enabled());
        assert!(matches!(TagFilter::parse(Some(".*")).unwrap(), TagFilter::ShowAll));

        let filter = TagFilter::parse(Some("people")).unwrap();
        assert!(filter.matches("People/Alice"));
        assert!(!filter.matches("Places/Paris"));
        assert!(matches!(TagFilter::parse(Some("(")), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_wildcard_album_query_equals_unfiltered() {
        let dk = engine(QueryOptions::default());
        let all = dk.query_album(None).unwrap();
        let wildcard = dk.query_album(Some(".*")).unwrap();
        assert_eq!(all.albums(), wildcard.albums());
        assert_eq!(all.albums().len(), 3);
    }

    #[test]
    fn test_album_query_by_substring() {
        let dk = engine(QueryOptions::default());
        let report = dk.query_album(Some("2024")).unwrap();
        let keys: Vec<&str> = report.albums().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/2024/garden", "/2024/trip"]);

        let trip = &report.albums()["/2024/trip"];
        assert_eq!(trip.get("Paris"), Some(&2));
        assert_eq!(trip.get("Alice"), Some(&2));
        assert_eq!(trip.len(), 2);
    }

    #[test]
    fn test_album_query_hides_bookkeeping_tags() {
        let dk = engine(QueryOptions::default());
        let report = dk.query_album(None).unwrap();
        for tags in report.albums().values() {
            for name in tags.keys() {
                assert!(!crate::tags::is_blacklisted(name));
                assert_ne!(name, "Pick Label Accepted");
            }
        }
    }

    #[test]
    fn test_album_query_full_tagname() {
        let dk = engine(QueryOptions { full_tagname: true, ..Default::default() });
        let report = dk.query_album(Some("trip")).unwrap();
        let trip = &report.albums()["/2024/trip"];
        assert_eq!(trip.get("Places/Paris"), Some(&2));
        assert_eq!(trip.get("People/Alice"), Some(&2));
    }

    #[test]
    fn test_album_query_root_filter() {
        let dk = engine(QueryOptions { root: Some("nas".into()), ..Default::default() });
        let report = dk.query_album(None).unwrap();
        let keys: Vec<&str> = report.albums().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/archive/1999"]);
    }

    #[test]
    fn test_empty_root_means_no_filter() {
        let dk = engine(QueryOptions { root: Some(String::new()), ..Default::default() });
        assert_eq!(dk.options().root, None);
        assert_eq!(dk.query_album(None).unwrap().albums().len(), 3);
    }

    #[test]
    fn test_skiptag_removes_only_that_tag() {
        let dk = engine(QueryOptions::default());
        let tree = dk.tag_tree().unwrap();
        let selection = AlbumSelection::All;
        let full = dk.query_albums(&tree, &selection, None).unwrap();
        let skipped = dk.query_albums(&tree, &selection, Some("Paris")).unwrap();
        let skipped_full = dk.query_albums(&tree, &selection, Some("Places/Paris")).unwrap();
        assert_eq!(skipped, skipped_full);

        for (album, tags) in &full {
            let mut expected = tags.clone();
            expected.remove("Paris");
            let actual = skipped.get(album).cloned().unwrap_or_default();
            assert_eq!(actual, expected, "album {}", album);
        }
    }

    #[test]
    fn test_query_tag_scenario() {
        let dk = engine(QueryOptions::default());
        let report = dk.query_tag(Some("paris"), false, false).unwrap();
        assert_eq!(report.entries().len(), 1);

        let entry = &report.entries()[0];
        assert_eq!(entry.full_name, "Places/Paris");
        let albums: Vec<(&str, &str, usize)> = entry
            .albums
            .iter()
            .map(|b| (b.root_label.as_str(), b.relative_path.as_str(), b.images.len()))
            .collect();
        assert_eq!(albums, vec![("home", "/2024/trip", 2), ("nas", "/archive/1999", 1)]);
    }

    #[test]
    fn test_query_tag_root_filter() {
        let dk = engine(QueryOptions { root: Some("home".into()), ..Default::default() });
        let report = dk.query_tag(Some("Paris"), true, false).unwrap();
        let entry = &report.entries()[0];
        assert_eq!(entry.albums.len(), 1);
        assert_eq!(entry.albums[0].relative_path, "/2024/trip");
        assert_eq!(entry.albums[0].images, vec!["eiffel.jpg", "louvre.jpg"]);
        assert!(report.to_string().lines().any(|l| l == "        2024/trip"));
    }

    #[test]
    fn test_query_tag_orders_by_album_count() {
        let dk = engine(QueryOptions { filter_tags: TagFilter::Disabled, ..Default::default() });
        let report = dk.query_tag(None, false, false).unwrap();
        let names: Vec<(&str, usize)> = report
            .entries()
            .iter()
            .map(|e| (e.full_name.as_str(), e.albums.len()))
            .collect();
        // Stable on flattening order for equal album counts
        assert_eq!(
            names,
            vec![("People/Alice", 2), ("Places/Paris", 2), ("Flowers", 1)]
        );
    }

    #[test]
    fn test_query_tag_cross_filter() {
        let dk = engine(QueryOptions::default());
        let report = dk.query_tag(Some("Alice"), false, false).unwrap();
        let entry = &report.entries()[0];
        assert_eq!(entry.full_name, "People/Alice");

        let garden = entry.albums.iter().find(|b| b.relative_path == "/2024/garden").unwrap();
        assert_eq!(garden.co_tags, vec![("Flowers".to_string(), 2)]);
        let trip = entry.albums.iter().find(|b| b.relative_path == "/2024/trip").unwrap();
        assert_eq!(trip.co_tags, vec![("Paris".to_string(), 2)]);
    }

    #[test]
    fn test_query_tag_cross_filter_pattern() {
        let filter = TagFilter::parse(Some("flow")).unwrap();
        let dk = engine(QueryOptions { filter_tags: filter, ..Default::default() });
        let report = dk.query_tag(Some("Alice"), false, false).unwrap();
        let entry = &report.entries()[0];
        for bucket in &entry.albums {
            for (name, _) in &bucket.co_tags {
                assert_eq!(name, "Flowers");
            }
        }
        let trip = entry.albums.iter().find(|b| b.relative_path == "/2024/trip").unwrap();
        assert!(trip.co_tags.is_empty());
    }

    #[test]
    fn test_query_tag_invalid_pattern() {
        let dk = engine(QueryOptions::default());
        assert!(matches!(dk.query_tag(Some("[a-"), false, false), Err(Error::InvalidPattern { .. })));
    }

    /// Log output collected in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn warnings_during(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.text()
    }

    #[test]
    fn test_album_query_warns_on_broken_rows() {
        let dk = engine(QueryOptions::default());
        let logs = warnings_during(|| {
            dk.query_album(None).unwrap();
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Images have no album, skipping"));
        assert!(logs.contains("Album has no album root, skipping"));
        assert!(logs.contains("album=/lost/root"));
    }

    #[test]
    fn test_query_tag_warns_on_broken_rows() {
        let dk = engine(QueryOptions { filter_tags: TagFilter::Disabled, ..Default::default() });
        let logs = warnings_during(|| {
            dk.query_tag(None, false, false).unwrap();
        });
        assert!(logs.contains("Image has no album, skipping"));
        assert!(logs.contains("image=loose.jpg"));
        assert!(logs.contains("Album has no album root, skipping image"));
        assert!(logs.contains("image=stray.jpg"));
    }

    #[test]
    fn test_query_tag_never_lists_internal_tags() {
        let dk = engine(QueryOptions::default());
        let report = dk.query_tag(Some("label"), false, false).unwrap();
        assert!(report.entries().is_empty());
    }
}
