//! Article lookup and search over the registered dumps.
//!
//! [`Wiki`] is built once at startup (registration needs `&mut`) and then
//! shared read-only, typically as `Arc<Wiki>`, by every caller.

mod links;
mod query;
mod resolver;

pub use query::{ResultEntry, ResultPage};
pub use resolver::Resolution;

use std::path::Path;

use crate::config::Settings;
use crate::registry::{PageSource, Registry};

pub struct Wiki<S = Registry> {
    source: S,
    settings: Settings,
}

impl Wiki<Registry> {
    pub fn new(settings: Settings) -> Self {
        Self::with_source(Registry::new(), settings)
    }

    pub fn register(&mut self, dump_path: impl AsRef<Path>) -> bool {
        self.source.register(dump_path)
    }

    pub fn register_dir(&mut self, dir: &Path, pattern: &str) -> usize {
        self.source.register_dir(dir, pattern)
    }

    pub fn dump_count(&self) -> usize {
        self.source.len()
    }
}

impl<S: PageSource> Wiki<S> {
    pub fn with_source(source: S, settings: Settings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn has_any(&self) -> bool {
        self.source.has_any()
    }

    /// Whether `url` is worth trying to resolve from the dumps.
    ///
    /// Conservative: a `true` does not mean the article exists, only that it
    /// is in the served namespace while at least one dump is registered.
    /// [`Wiki::resolve`] is the authoritative check.
    pub fn may_be_cached(&self, url: &str) -> bool {
        self.article_segment(url).is_some()
    }

    /// The encoded title segment of a servable article URL.
    fn article_segment<'a>(&self, url: &'a str) -> Option<&'a str> {
        if !self.has_any() {
            return None;
        }
        let segment = links::title_segment(url, &self.settings.prefix)?;
        if links::is_media(segment) {
            return None;
        }
        Some(segment)
    }
}
