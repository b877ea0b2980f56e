use serde::Serialize;
use tracing::{debug, warn};

use super::Wiki;
use super::links;
use crate::index::SearchScope;
use crate::registry::{Candidate, PageSource};

/// One window of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    /// Size of the capped hit pool, independent of the window. Never more
    /// than the configured `max_hits`, even when more documents match.
    pub total_hits: usize,
    pub entries: Vec<ResultEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub title: String,
    pub summary: String,
    pub url: String,
}

impl<S: PageSource> Wiki<S> {
    /// Ranked results `offset..offset + amount` for free text.
    ///
    /// Never fails: a broken search is logged and yields an empty page, and a
    /// window past the end yields no entries with the total still reported.
    pub fn query(&self, text: &str, offset: usize, amount: usize) -> ResultPage {
        let text = text.to_lowercase();
        let max_hits = self.settings.max_hits;

        let mut pool = match self.source.search(&text, SearchScope::FullText, max_hits) {
            Ok(pool) => pool,
            Err(e) => {
                warn!(query = %text, error = %e, "search failed");
                Vec::new()
            }
        };
        pool.truncate(max_hits);

        let total_hits = pool.len();
        let start = offset.min(total_hits);
        let end = offset.saturating_add(amount).min(total_hits);

        let entries = pool[start..end]
            .iter()
            .map(|page| self.result_entry(page))
            .collect();

        debug!(query = %text, total_hits, offset, amount, "query complete");
        ResultPage {
            total_hits,
            entries,
        }
    }

    fn result_entry(&self, page: &S::Page) -> ResultEntry {
        let summary = page.summary().unwrap_or_else(|e| {
            warn!(title = %page.title(), error = %e, "summary unavailable");
            String::new()
        });
        ResultEntry {
            title: page.title().to_string(),
            summary,
            url: links::article_url(&self.settings.prefix, page.title()),
        }
    }
}
