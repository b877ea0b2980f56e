use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Media pages are never served from a dump.
pub const MEDIA_NAMESPACE: &str = "File:";

/// Characters to percent-encode in a title path segment.
/// Keeps `/`, `:` and `,` readable the way article URLs usually show them.
const TITLE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// The still-encoded title segment of `url`, without any query or fragment.
/// `None` when `url` is not under `prefix`.
pub(crate) fn title_segment<'a>(url: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = url.strip_prefix(prefix)?;
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

pub(crate) fn is_media(segment: &str) -> bool {
    percent_decode_str(segment)
        .decode_utf8_lossy()
        .starts_with(MEDIA_NAMESPACE)
}

/// Percent-decodes a title segment and turns URL underscores into the
/// spaces display titles use.
pub(crate) fn decode_title(segment: &str) -> Result<String, std::str::Utf8Error> {
    let decoded = percent_decode_str(segment).decode_utf8()?;
    Ok(decoded.replace('_', " "))
}

/// Fully qualified article URL for `title`. A `#section` suffix on the title
/// becomes the URL fragment.
pub(crate) fn article_url(prefix: &str, title: &str) -> String {
    let (title, section) = match title.split_once('#') {
        Some((title, section)) => (title, Some(section)),
        None => (title, None),
    };

    let mut url = String::with_capacity(prefix.len() + title.len());
    url.push_str(prefix);
    url.push_str(&encode_segment(title));
    if let Some(section) = section.filter(|s| !s.is_empty()) {
        url.push('#');
        url.push_str(&encode_segment(section));
    }
    url
}

fn encode_segment(text: &str) -> String {
    utf8_percent_encode(&text.replace(' ', "_"), TITLE_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "http://en.wikipedia.org/wiki/";

    #[test]
    fn segment_requires_prefix() {
        assert_eq!(
            title_segment("http://en.wikipedia.org/wiki/Rust", PREFIX),
            Some("Rust")
        );
        assert_eq!(
            title_segment("https://en.wikipedia.org/wiki/Rust", PREFIX),
            None
        );
        assert_eq!(
            title_segment("http://de.wikipedia.org/wiki/Rust", PREFIX),
            None
        );
        assert_eq!(
            title_segment("http://en.wikipedia.org/w/index.php", PREFIX),
            None
        );
    }

    #[test]
    fn segment_drops_query_and_fragment() {
        assert_eq!(
            title_segment("http://en.wikipedia.org/wiki/Rust#History", PREFIX),
            Some("Rust")
        );
        assert_eq!(
            title_segment("http://en.wikipedia.org/wiki/Rust?oldid=1", PREFIX),
            Some("Rust")
        );
        assert_eq!(title_segment(PREFIX, PREFIX), Some(""));
    }

    #[test]
    fn detects_media_namespace() {
        assert!(is_media("File:Example.jpg"));
        assert!(is_media("File%3AExample.jpg"));
        assert!(!is_media("Filet_mignon"));
        assert!(!is_media("file:lowercase.jpg"));
    }

    #[test]
    fn decodes_percent_escapes_and_underscores() {
        assert_eq!(decode_title("New_York").unwrap(), "New York");
        assert_eq!(decode_title("Caf%C3%A9_au_lait").unwrap(), "Café au lait");
        assert_eq!(decode_title("AC%2FDC").unwrap(), "AC/DC");
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(decode_title("Bad%FF%FE").is_err());
    }

    #[test]
    fn article_url_encodes_title() {
        assert_eq!(
            article_url(PREFIX, "New York City"),
            "http://en.wikipedia.org/wiki/New_York_City"
        );
        assert_eq!(
            article_url(PREFIX, "Café"),
            "http://en.wikipedia.org/wiki/Caf%C3%A9"
        );
        assert_eq!(
            article_url(PREFIX, "100% Pure?"),
            "http://en.wikipedia.org/wiki/100%25_Pure%3F"
        );
    }

    #[test]
    fn article_url_keeps_section_as_fragment() {
        assert_eq!(
            article_url(PREFIX, "Rust (programming language)#Early history"),
            "http://en.wikipedia.org/wiki/Rust_(programming_language)#Early_history"
        );
        assert_eq!(
            article_url(PREFIX, "Rust#"),
            "http://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn article_url_round_trips_through_decode() {
        for title in ["New York", "Café au lait", "100% Pure?", "C++", "AC/DC"] {
            let url = article_url(PREFIX, title);
            let segment = title_segment(&url, PREFIX).unwrap();
            assert_eq!(decode_title(segment).unwrap(), title);
        }
    }
}
