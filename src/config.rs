use crate::render::ContentFormat;

pub const DEFAULT_PREFIX: &str = "http://en.wikipedia.org/wiki/";
/// Fuzzy title hits scanned for an exact match. Larger values find exact
/// titles ranked further down at the cost of loading more candidates.
pub const DEFAULT_WINDOW: usize = 5;
/// Hits a query considers before pagination. Results ranked past this are
/// never visible, and `total_hits` never exceeds it.
pub const DEFAULT_MAX_HITS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid article prefix '{prefix}': {source}")]
    Url {
        prefix: String,
        source: url::ParseError,
    },

    #[error("article prefix '{0}' must be an http(s) URL ending in '/'")]
    Prefix(String),

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Resolver and query tunables, fixed once the wiki is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Article URL prefix, e.g. `http://en.wikipedia.org/wiki/`.
    pub prefix: String,
    pub window: usize,
    pub max_hits: usize,
    pub format: ContentFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            window: DEFAULT_WINDOW,
            max_hits: DEFAULT_MAX_HITS,
            format: ContentFormat::default(),
        }
    }
}

impl Settings {
    pub fn new(
        prefix: &str,
        window: usize,
        max_hits: usize,
        format: ContentFormat,
    ) -> Result<Self, SettingsError> {
        let parsed = url::Url::parse(prefix).map_err(|source| SettingsError::Url {
            prefix: prefix.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || !prefix.ends_with('/') {
            return Err(SettingsError::Prefix(prefix.to_string()));
        }
        if window == 0 {
            return Err(SettingsError::Zero("window"));
        }
        if max_hits == 0 {
            return Err(SettingsError::Zero("max-hits"));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            window,
            max_hits,
            format,
        })
    }
}
