use serde::{Deserialize, Serialize};
use url::Url;

/// The latest episode of one show, as extracted from a single feed fetch.
///
/// Transient: nothing here is persisted except `guid`, which enters the
/// posted record once the episode has been announced. All links are
/// normalized at construction so identical logical URLs compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub show_title: String,
    pub show_author: Option<String>,
    pub show_image: Option<String>,
    /// Canonical show link from the feed document, normalized.
    pub link: String,
    /// The feed URL this episode was fetched from, normalized.
    pub feed_url: String,
    pub guid: String,
    pub episode_title: String,
    pub episode_link: Option<String>,
    pub episode_image: Option<String>,
    pub episode_description: Option<String>,
}

/// Normalizes a URL so that logically identical links compare equal:
/// lowercased scheme and host, default port elided, `https` assumed when no
/// scheme is given, trailing slashes trimmed.
pub fn normalize_link(raw: &str) -> Result<String, url::ParseError> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut parsed = Url::parse(&with_scheme)?;
    if parsed.path().ends_with('/') && parsed.path() != "/" {
        let path = parsed.path().trim_end_matches('/').to_string();
        parsed.set_path(&path);
    }

    let mut normalized = parsed.to_string();
    if parsed.path() == "/"
        && parsed.query().is_none()
        && parsed.fragment().is_none()
        && normalized.ends_with('/')
    {
        normalized.pop();
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_scheme_and_host() {
        let url = normalize_link("HTTPS://Feeds.Example.COM/Show").unwrap();
        assert_eq!(url, "https://feeds.example.com/Show");
    }

    #[test]
    fn test_preserves_path_case() {
        let url = normalize_link("https://example.com/RSS/Feed.xml").unwrap();
        assert_eq!(url, "https://example.com/RSS/Feed.xml");
    }

    #[test]
    fn test_elides_default_port() {
        assert_eq!(
            normalize_link("http://example.com:80/feed").unwrap(),
            "http://example.com/feed"
        );
        assert_eq!(
            normalize_link("https://example.com:443/feed").unwrap(),
            "https://example.com/feed"
        );
        assert_eq!(
            normalize_link("https://example.com:8443/feed").unwrap(),
            "https://example.com:8443/feed"
        );
    }

    #[test]
    fn test_trims_trailing_slashes() {
        assert_eq!(
            normalize_link("https://example.com/feed/").unwrap(),
            "https://example.com/feed"
        );
        assert_eq!(
            normalize_link("https://example.com/feed///").unwrap(),
            "https://example.com/feed"
        );
        assert_eq!(
            normalize_link("https://example.com/").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_defaults_to_https_scheme() {
        assert_eq!(
            normalize_link("example.com/podcast/rss").unwrap(),
            "https://example.com/podcast/rss"
        );
    }

    #[test]
    fn test_identical_logical_urls_compare_equal() {
        let a = normalize_link("HTTPS://Example.com:443/feed/").unwrap();
        let b = normalize_link("https://example.com/feed").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(normalize_link("http://").is_err());
    }
}
