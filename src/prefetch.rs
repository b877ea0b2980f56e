//! Resolve many article URLs concurrently against one shared wiki.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::registry::PageSource;
use crate::wiki::{Resolution, Wiki};

#[derive(Debug, Default)]
pub struct PrefetchReport {
    pub found: Vec<String>,
    pub redirects: Vec<Redirected>,
    pub missing: Vec<String>,
    pub failed: Vec<FailedUrl>,
}

#[derive(Debug)]
pub struct Redirected {
    pub url: String,
    pub target: String,
}

#[derive(Debug)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

impl PrefetchReport {
    pub fn total(&self) -> usize {
        self.found.len() + self.redirects.len() + self.missing.len() + self.failed.len()
    }
}

/// Resolves `urls` on the blocking pool, at most `concurrency` at a time.
///
/// A lookup that outlives `timeout` is reported as failed; the blocking task
/// itself runs to completion in the background.
pub async fn prefetch<S>(
    wiki: Arc<Wiki<S>>,
    urls: Vec<String>,
    concurrency: usize,
    timeout: Duration,
) -> PrefetchReport
where
    S: PageSource + Send + Sync + 'static,
{
    let outcomes: Vec<_> = stream::iter(urls)
        .map(|url| {
            let wiki = Arc::clone(&wiki);
            async move {
                let lookup = tokio::task::spawn_blocking({
                    let url = url.clone();
                    move || wiki.resolve_detailed(&url)
                });
                let outcome = tokio::time::timeout(timeout, lookup).await;
                (url, outcome)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = PrefetchReport::default();
    for (url, outcome) in outcomes {
        match outcome {
            Ok(Ok(Resolution::Found(_))) => report.found.push(url),
            Ok(Ok(Resolution::Redirect(target))) => {
                report.redirects.push(Redirected { url, target });
            }
            Ok(Ok(Resolution::NotFound)) => report.missing.push(url),
            Ok(Ok(Resolution::Failed(e))) => report.failed.push(FailedUrl {
                url,
                reason: e.to_string(),
            }),
            Ok(Err(e)) => {
                warn!(%url, error = %e, "lookup task aborted");
                report.failed.push(FailedUrl {
                    url,
                    reason: format!("lookup aborted: {e}"),
                });
            }
            Err(_) => {
                warn!(%url, timeout_secs = timeout.as_secs_f64(), "lookup timed out");
                report.failed.push(FailedUrl {
                    url,
                    reason: format!("timed out after {}s", timeout.as_secs_f64()),
                });
            }
        }
    }

    report.found.sort();
    report.missing.sort();
    report.redirects.sort_by(|a, b| a.url.cmp(&b.url));
    report.failed.sort_by(|a, b| a.url.cmp(&b.url));
    report
}
