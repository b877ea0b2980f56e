//! Pre-built `tantivy` index accompanying a dump.
//!
//! The index for `pages.owd` lives in the sibling directory `pages.owd.idx`.
//! Building it is someone else's job; this module only opens and queries it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, STORED, Schema, TEXT, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use crate::dump::{DumpError, DumpFile, PageLocation, PageRecord};

pub const INDEX_DIR_SUFFIX: &str = ".idx";

/// Title matches outrank body matches in full-text queries.
const TITLE_BOOST: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("dump file not found: {}", .0.display())]
    MissingDump(PathBuf),

    #[error("no pre-built index at {}", .0.display())]
    MissingIndex(PathBuf),

    #[error("index schema has no `{0}` field")]
    Schema(&'static str),

    #[error("index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error("indexed document is missing `{0}`")]
    MissingValue(&'static str),

    #[error("index points at page '{found}' but '{expected}' was indexed")]
    Mismatch { expected: String, found: String },
}

/// Which fields a search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Page titles only; used to find a page by name.
    Titles,
    /// Titles (boosted) and article text.
    FullText,
}

/// Field handles every accompanying index must provide.
#[derive(Debug, Clone, Copy)]
pub struct IndexFields {
    pub title: Field,
    pub body: Field,
    pub summary: Field,
    pub redirect: Field,
    pub cluster: Field,
    pub slot: Field,
}

impl IndexFields {
    /// The schema an accompanying index is expected to be built with.
    pub fn schema() -> Schema {
        let mut builder = Schema::builder();
        builder.add_text_field("title", TEXT | STORED);
        builder.add_text_field("body", TEXT);
        builder.add_text_field("summary", STORED);
        builder.add_text_field("redirect", STORED);
        builder.add_u64_field("cluster", STORED);
        builder.add_u64_field("slot", STORED);
        builder.build()
    }

    pub fn from_schema(schema: &Schema) -> Result<Self, IndexError> {
        let field = |name: &'static str| {
            schema
                .get_field(name)
                .map_err(|_| IndexError::Schema(name))
        };
        Ok(Self {
            title: field("title")?,
            body: field("body")?,
            summary: field("summary")?,
            redirect: field("redirect")?,
            cluster: field("cluster")?,
            slot: field("slot")?,
        })
    }
}

/// Where the index for `dump` is expected to be.
pub fn index_dir_for(dump: &Path) -> PathBuf {
    let mut dir = OsString::from(dump.as_os_str());
    dir.push(INDEX_DIR_SUFFIX);
    PathBuf::from(dir)
}

/// Stored metadata for one hit. The article itself stays in the dump.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub title: String,
    pub redirect: Option<String>,
    pub location: PageLocation,
}

/// One opened dump together with its index.
pub struct DumpIndex {
    dump: DumpFile,
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
}

impl std::fmt::Debug for DumpIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpIndex")
            .field("dump", &self.dump.path())
            .finish_non_exhaustive()
    }
}

impl DumpIndex {
    pub fn open(dump_path: &Path) -> Result<Self, IndexError> {
        if !dump_path.is_file() {
            return Err(IndexError::MissingDump(dump_path.to_path_buf()));
        }
        let index_dir = index_dir_for(dump_path);
        if !index_dir.is_dir() {
            return Err(IndexError::MissingIndex(index_dir));
        }

        let dump = DumpFile::open(dump_path)?;
        let index = Index::open_in_dir(&index_dir)?;
        let fields = IndexFields::from_schema(&index.schema())?;
        // The index is never written to while open, so there is nothing to reload.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        debug!(
            dump = %dump_path.display(),
            docs = reader.searcher().num_docs(),
            "index opened"
        );
        Ok(Self {
            dump,
            index,
            reader,
            fields,
        })
    }

    pub fn dump_path(&self) -> &Path {
        self.dump.path()
    }

    /// Ranked hits for `text`, best first, at most `limit` of them.
    pub fn search(
        &self,
        text: &str,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<(f32, DocAddress)>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let Some(query) = self.build_query(text, scope)? else {
            return Ok(Vec::new());
        };

        let searcher = self.reader.searcher();
        // The collector preallocates for `limit`; no index holds more hits than docs.
        let limit = limit.min(usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX));
        if limit == 0 {
            return Ok(Vec::new());
        }
        let collector = TopDocs::with_limit(limit);
        Ok(searcher.search(query.as_ref(), &collector)?)
    }

    /// Terms are produced by the field's own analyzer, so query text never
    /// goes through the query-language parser and needs no escaping.
    fn build_query(
        &self,
        text: &str,
        scope: SearchScope,
    ) -> Result<Option<Box<dyn Query>>, IndexError> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for term in self.terms(self.fields.title, text)? {
            let query: Box<dyn Query> =
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
            let query = match scope {
                SearchScope::Titles => query,
                SearchScope::FullText => Box::new(BoostQuery::new(query, TITLE_BOOST)),
            };
            clauses.push((Occur::Should, query));
        }

        if scope == SearchScope::FullText {
            for term in self.terms(self.fields.body, text)? {
                clauses.push((
                    Occur::Should,
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
                ));
            }
        }

        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }

    fn terms(&self, field: Field, text: &str) -> Result<Vec<Term>, IndexError> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while let Some(token) = stream.next() {
            let term = Term::from_field_text(field, &token.text);
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        Ok(terms)
    }

    pub fn entry(&self, doc: DocAddress) -> Result<IndexEntry, IndexError> {
        let stored: TantivyDocument = self.reader.searcher().doc(doc)?;
        let text = |field: Field| {
            stored
                .get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let number = |field: Field, name: &'static str| {
            stored
                .get_first(field)
                .and_then(|v| v.as_u64())
                .ok_or(IndexError::MissingValue(name))
        };

        Ok(IndexEntry {
            title: text(self.fields.title).ok_or(IndexError::MissingValue("title"))?,
            redirect: text(self.fields.redirect).filter(|r| !r.is_empty()),
            location: PageLocation {
                cluster: number(self.fields.cluster, "cluster")?,
                slot: number(self.fields.slot, "slot")?,
            },
        })
    }

    /// Stored plain-text summary; empty when the index carries none.
    pub fn summary(&self, doc: DocAddress) -> Result<String, IndexError> {
        let stored: TantivyDocument = self.reader.searcher().doc(doc)?;
        Ok(stored
            .get_first(self.fields.summary)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    /// Reads the page behind `entry` from the dump.
    pub fn page(&self, entry: &IndexEntry) -> Result<PageRecord, IndexError> {
        let record = self.dump.read_page(entry.location)?;
        if record.title != entry.title {
            return Err(IndexError::Mismatch {
                expected: entry.title.clone(),
                found: record.title,
            });
        }
        Ok(record)
    }
}
