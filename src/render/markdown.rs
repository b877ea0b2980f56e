/// Converts article HTML to Markdown and prefixes a front matter block with the title.
pub(super) fn to_markdown(title: &str, html: &str) -> String {
    let body = html2md::rewrite_html(html, false);

    let mut out = String::from("---\n");
    out.push_str(&format!("title: \"{}\"\n", escape_yaml(title)));
    out.push_str("---\n\n");
    out.push_str(body.trim());
    out.push('\n');
    out
}

fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
