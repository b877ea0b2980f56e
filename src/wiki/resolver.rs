use tracing::{debug, warn};

use super::Wiki;
use super::links;
use crate::index::{IndexError, SearchScope};
use crate::registry::{Candidate, PageSource};

#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error("title is not valid UTF-8 once decoded: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Outcome of resolving one article URL.
#[derive(Debug)]
pub enum Resolution {
    /// Rendered article content.
    Found(String),
    /// The article is a redirect; re-resolve this URL to follow it.
    Redirect(String),
    NotFound,
    /// Lookup broke down. Reported to callers exactly like `NotFound`.
    Failed(WikiError),
}

impl Resolution {
    /// `(content, redirect)` as the proxy layer consumes it: at most one is set,
    /// and both are `None` for missing articles and failures alike.
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        match self {
            Resolution::Found(content) => (Some(content), None),
            Resolution::Redirect(url) => (None, Some(url)),
            Resolution::NotFound | Resolution::Failed(_) => (None, None),
        }
    }
}

impl<S: PageSource> Wiki<S> {
    /// Content or redirect target for `url`; `(None, None)` when it cannot be served.
    pub fn resolve(&self, url: &str) -> (Option<String>, Option<String>) {
        self.resolve_detailed(url).into_parts()
    }

    pub fn resolve_detailed(&self, url: &str) -> Resolution {
        match self.try_resolve(url) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(%url, error = %e, "article lookup failed");
                Resolution::Failed(e)
            }
        }
    }

    fn try_resolve(&self, url: &str) -> Result<Resolution, WikiError> {
        let Some(segment) = self.article_segment(url) else {
            return Ok(Resolution::NotFound);
        };
        let title = links::decode_title(segment)?;
        if title.is_empty() {
            return Ok(Resolution::NotFound);
        }

        // The index matches case-insensitively, so fetch a few ranked
        // candidates and insist on an exact title among them.
        let candidates = self
            .source
            .search(&title, SearchScope::Titles, self.settings.window)?;
        let Some(page) = select_exact(&candidates, &title) else {
            debug!(%title, candidates = candidates.len(), "no exact title match");
            return Ok(Resolution::NotFound);
        };

        if let Some(target) = page.redirect_target().filter(|t| !t.is_empty()) {
            debug!(%title, %target, "article redirects");
            return Ok(Resolution::Redirect(links::article_url(
                &self.settings.prefix,
                target,
            )));
        }

        let html = page.html()?;
        debug!(%title, bytes = html.len(), "article resolved");
        let content = self.settings.format.render(page.title(), &html);
        Ok(Resolution::Found(content))
    }
}

/// First candidate, in rank order, whose title equals `title` exactly.
fn select_exact<'a, P: Candidate>(candidates: &'a [P], title: &str) -> Option<&'a P> {
    candidates.iter().find(|page| page.title() == title)
}
