//! Turns stored article HTML into what the caller serves.

mod markdown;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ContentFormat {
    /// Standalone HTML document around the stored article markup.
    #[default]
    Html,
    /// Markdown with a front matter block carrying the title.
    Markdown,
}

impl ContentFormat {
    pub fn render(self, title: &str, html: &str) -> String {
        match self {
            ContentFormat::Html => html_document(title, html),
            ContentFormat::Markdown => markdown::to_markdown(title, html),
        }
    }
}

fn html_document(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    )
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
