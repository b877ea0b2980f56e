//! Dump and index fixtures for tests.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexWriter, TantivyDocument};

use crate::dump::{PageRecord, write_dump};
use crate::index::{IndexFields, index_dir_for};

const WRITER_HEAP_BYTES: usize = 20_000_000;
const PAGES_PER_CLUSTER: usize = 3;

pub(crate) struct FixturePage {
    pub title: String,
    pub text: String,
    pub redirect: Option<String>,
}

impl FixturePage {
    pub fn article(title: &str, text: &str) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            redirect: None,
        }
    }

    pub fn redirect(title: &str, target: &str) -> Self {
        Self {
            title: title.into(),
            text: String::new(),
            redirect: Some(target.into()),
        }
    }

    fn html(&self) -> String {
        if self.text.is_empty() {
            String::new()
        } else {
            format!("<p>{}</p>", self.text)
        }
    }
}

/// Writes `name` plus its accompanying index under `dir` and returns the dump path.
pub(crate) fn build_dump(dir: &Path, name: &str, pages: &[FixturePage]) -> PathBuf {
    let path = dir.join(name);
    let records: Vec<PageRecord> = pages
        .iter()
        .map(|p| PageRecord {
            title: p.title.clone(),
            html: p.html(),
            redirect: p.redirect.clone(),
        })
        .collect();
    let locations = write_dump(&path, &records, PAGES_PER_CLUSTER).unwrap();

    let index_dir = index_dir_for(&path);
    std::fs::create_dir(&index_dir).unwrap();
    let schema = IndexFields::schema();
    let fields = IndexFields::from_schema(&schema).unwrap();
    let index = Index::create_in_dir(&index_dir, schema).unwrap();
    let mut writer: IndexWriter = index
        .writer_with_num_threads(1, WRITER_HEAP_BYTES)
        .unwrap();

    for (page, location) in pages.iter().zip(locations) {
        let mut doc = TantivyDocument::default();
        doc.add_text(fields.title, &page.title);
        doc.add_text(fields.body, &page.text);
        doc.add_text(fields.summary, &page.text);
        if let Some(target) = &page.redirect {
            doc.add_text(fields.redirect, target);
        }
        doc.add_u64(fields.cluster, location.cluster);
        doc.add_u64(fields.slot, location.slot);
        writer.add_document(doc).unwrap();
    }
    writer.commit().unwrap();

    path
}
