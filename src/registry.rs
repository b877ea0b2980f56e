//! Registered dump indices, and the page-source seam the wiki layer searches through.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use globset::Glob;
use tantivy::DocAddress;
use tracing::{debug, info, warn};

use crate::index::{DumpIndex, IndexEntry, IndexError, SearchScope};

/// One ranked search hit. Content and summary are loaded only when asked for.
pub trait Candidate {
    fn title(&self) -> &str;
    fn redirect_target(&self) -> Option<&str>;
    /// Stored article HTML, read from the dump.
    fn html(&self) -> Result<String, IndexError>;
    fn summary(&self) -> Result<String, IndexError>;
}

/// Anything the resolver and query engine can search.
/// Implemented by [`Registry`]; tests substitute canned hit lists.
pub trait PageSource {
    type Page: Candidate;

    fn has_any(&self) -> bool;

    /// Ranked hits across every index, best first, at most `max_hits`.
    fn search(
        &self,
        query: &str,
        scope: SearchScope,
        max_hits: usize,
    ) -> Result<Vec<Self::Page>, IndexError>;
}

/// Opened dump indices keyed by lowercased dump path.
///
/// Iteration follows key order, so merged rankings do not depend on the order
/// dumps were registered in.
#[derive(Debug, Default)]
pub struct Registry {
    indices: BTreeMap<String, Arc<DumpIndex>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the dump and its accompanying index. Returns false, leaving the
    /// registry untouched, when either is missing or unusable. Registering the
    /// same path again replaces the earlier entry.
    pub fn register(&mut self, dump_path: impl AsRef<Path>) -> bool {
        let dump_path = dump_path.as_ref();
        match DumpIndex::open(dump_path) {
            Ok(index) => {
                let key = normalize_key(dump_path);
                info!(dump = %dump_path.display(), "dump registered");
                if let Some(old) = self.indices.insert(key, Arc::new(index)) {
                    debug!(replaced = %old.dump_path().display(), "earlier registration replaced");
                }
                true
            }
            Err(e) => {
                warn!(dump = %dump_path.display(), error = %e, "dump not registered");
                false
            }
        }
    }

    /// Registers every file in `dir` whose name matches the glob `pattern`.
    /// Returns how many registrations succeeded.
    pub fn register_dir(&mut self, dir: &Path, pattern: &str) -> usize {
        let matcher = match Glob::new(pattern) {
            Ok(glob) => glob.compile_matcher(),
            Err(e) => {
                warn!(%pattern, error = %e, "invalid dump pattern");
                return 0;
            }
        };
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read dump directory");
                return 0;
            }
        };

        let mut candidates: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| matcher.is_match(name))
            })
            .collect();
        candidates.sort();

        let registered = candidates.iter().filter(|path| self.register(path)).count();
        debug!(
            dir = %dir.display(),
            found = candidates.len(),
            registered,
            "dump directory scanned"
        );
        registered
    }

    pub fn has_any(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

fn normalize_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

impl PageSource for Registry {
    type Page = DumpPage;

    fn has_any(&self) -> bool {
        Registry::has_any(self)
    }

    /// Merges each index's hits by raw score. Scores are computed from each
    /// index's own term statistics, so the ordering across dumps is approximate.
    fn search(
        &self,
        query: &str,
        scope: SearchScope,
        max_hits: usize,
    ) -> Result<Vec<DumpPage>, IndexError> {
        let mut ranked = Vec::new();
        for index in self.indices.values() {
            for (score, doc) in index.search(query, scope, max_hits)? {
                ranked.push((score, Arc::clone(index), doc));
            }
        }
        // Stable: equal scores keep registry order.
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.truncate(max_hits);

        debug!(%query, ?scope, hits = ranked.len(), "registry search");
        ranked
            .into_iter()
            .map(|(_, index, doc)| DumpPage::load(index, doc))
            .collect()
    }
}

/// A hit in one registered dump.
#[derive(Debug, Clone)]
pub struct DumpPage {
    index: Arc<DumpIndex>,
    doc: DocAddress,
    entry: IndexEntry,
}

impl DumpPage {
    fn load(index: Arc<DumpIndex>, doc: DocAddress) -> Result<Self, IndexError> {
        let entry = index.entry(doc)?;
        Ok(Self { index, doc, entry })
    }
}

impl Candidate for DumpPage {
    fn title(&self) -> &str {
        &self.entry.title
    }

    fn redirect_target(&self) -> Option<&str> {
        self.entry.redirect.as_deref()
    }

    fn html(&self) -> Result<String, IndexError> {
        Ok(self.index.page(&self.entry)?.html)
    }

    fn summary(&self) -> Result<String, IndexError> {
        self.index.summary(self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FixturePage, build_dump};

    #[test]
    fn empty_registry_has_nothing() {
        let registry = Registry::new();
        assert!(!registry.has_any());
        let hits = registry
            .search("anything", SearchScope::FullText, 10)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn register_missing_dump_fails_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new();
        assert!(!registry.register(dir.path().join("absent.owd")));
        assert!(!registry.has_any());
    }

    #[test]
    fn register_dump_without_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.owd");
        crate::dump::write_dump(&path, &[], 1).unwrap();

        let mut registry = Registry::new();
        assert!(!registry.register(&path));
        assert!(!registry.has_any());
    }

    #[test]
    fn registering_twice_keeps_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_dump(
            dir.path(),
            "pages.owd",
            &[FixturePage::article("Berlin", "Capital of Germany.")],
        );

        let mut registry = Registry::new();
        assert!(registry.register(&path));
        assert!(registry.register(&path));
        assert!(registry.has_any());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(
            normalize_key(Path::new("/Data/EnWiki.OWD")),
            normalize_key(Path::new("/data/enwiki.owd"))
        );
    }

    #[test]
    fn search_merges_indices_by_score() {
        let dir = tempfile::tempdir().unwrap();
        let first = build_dump(
            dir.path(),
            "a.owd",
            &[FixturePage::article("Lisbon", "Capital of Portugal.")],
        );
        let second = build_dump(
            dir.path(),
            "b.owd",
            &[
                FixturePage::article("Porto", "City in Portugal."),
                FixturePage::article("Madrid", "Capital of Spain."),
            ],
        );

        let mut registry = Registry::new();
        assert!(registry.register(&first));
        assert!(registry.register(&second));

        let hits = registry
            .search("portugal", SearchScope::FullText, 10)
            .unwrap();
        let mut titles: Vec<_> = hits.iter().map(|h| h.title().to_string()).collect();
        titles.sort();
        assert_eq!(titles, ["Lisbon", "Porto"]);

        let capped = registry
            .search("capital", SearchScope::FullText, 1)
            .unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn dump_page_loads_content_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_dump(
            dir.path(),
            "pages.owd",
            &[FixturePage::article("Oslo", "Capital of Norway.")],
        );
        let mut registry = Registry::new();
        assert!(registry.register(&path));

        let hits = registry.search("oslo", SearchScope::Titles, 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].redirect_target(), None);
        assert_eq!(hits[0].html().unwrap(), "<p>Capital of Norway.</p>");
        assert_eq!(hits[0].summary().unwrap(), "Capital of Norway.");
    }

    #[test]
    fn register_dir_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        build_dump(
            dir.path(),
            "one.owd",
            &[FixturePage::article("One", "First.")],
        );
        build_dump(
            dir.path(),
            "two.owd",
            &[FixturePage::article("Two", "Second.")],
        );
        std::fs::write(dir.path().join("notes.txt"), "not a dump").unwrap();

        let mut registry = Registry::new();
        assert_eq!(registry.register_dir(dir.path(), "*.owd"), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn register_dir_tolerates_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new();
        assert_eq!(registry.register_dir(&dir.path().join("nope"), "*.owd"), 0);
        assert_eq!(registry.register_dir(dir.path(), "[unclosed"), 0);
        assert!(!registry.has_any());
    }
}
