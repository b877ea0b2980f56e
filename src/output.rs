//! Plain-text and Markdown rendering of command results.

use crate::prefetch::PrefetchReport;
use crate::wiki::ResultPage;

/// Escape characters that break Markdown link syntax: `[`, `]`, `(`, `)`.
fn escape_md_link(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '[' | ']' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Collapse line breaks so user text cannot break a heading or list item.
fn single_line(s: &str) -> String {
    s.split(['\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_results(page: &ResultPage, query: &str, offset: usize) -> String {
    let mut out = format!("# Search: {}\n\n", single_line(query));

    if page.entries.is_empty() {
        let total = page.total_hits;
        out.push_str(&format!("No results to show ({total} total).\n"));
        return out;
    }

    let first = offset + 1;
    let last = offset + page.entries.len();
    let total = page.total_hits;
    out.push_str(&format!("Results {first}-{last} of {total}\n\n"));

    for (i, entry) in page.entries.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}]({})\n",
            first + i,
            escape_md_link(&entry.title),
            escape_md_link(&entry.url)
        ));
        let summary = single_line(&entry.summary);
        if !summary.is_empty() {
            out.push_str(&format!("   {summary}\n"));
        }
    }

    out
}

pub fn format_prefetch(report: &PrefetchReport) -> String {
    let mut out = format!(
        "{} urls: {} found, {} redirected, {} missing, {} failed\n",
        report.total(),
        report.found.len(),
        report.redirects.len(),
        report.missing.len(),
        report.failed.len()
    );

    if !report.redirects.is_empty() {
        out.push_str("\nRedirects:\n");
        for r in &report.redirects {
            out.push_str(&format!("- {} -> {}\n", r.url, r.target));
        }
    }

    if !report.missing.is_empty() {
        out.push_str("\nMissing:\n");
        for url in &report.missing {
            out.push_str(&format!("- {url}\n"));
        }
    }

    if !report.failed.is_empty() {
        out.push_str("\nFailed:\n");
        for failed in &report.failed {
            out.push_str(&format!("- {} ({})\n", failed.url, failed.reason));
        }
    }

    out
}
