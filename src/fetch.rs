use crate::podcast::{normalize_link, Episode};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("could not parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
    #[error("feed has no usable {0}")]
    MalformedFeed(&'static str),
}

/// Boundary for fetching the latest episode of a feed, mockable in tests.
#[async_trait]
pub trait FeedFetch {
    async fn fetch(&self, url: &str) -> Result<Episode, FetchError>;
}

pub struct RssFetcher {
    client: reqwest::Client,
}

impl RssFetcher {
    pub fn new() -> Self {
        RssFetcher {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for RssFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetch for RssFetcher {
    async fn fetch(&self, url: &str) -> Result<Episode, FetchError> {
        let response = self.client.get(url)
            // See: https://stackoverflow.com/a/7001617/5155484
            .header(
                "Accept",
                "application/rss+xml, application/rdf+xml, application/atom+xml, application/feed+json, application/xml;q=0.9, text/xml;q=0.8"
            )
            .header("User-Agent", concat!("podcrier/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.bytes().await?;
        parse_episode(&body, url)
    }
}

/// Maps the first entry of a feed document to an [`Episode`].
///
/// Show title, entry guid, and entry title are mandatory. The show link is
/// normalized, falling back to the fetch url when the document omits it.
pub fn parse_episode(body: &[u8], feed_url: &str) -> Result<Episode, FetchError> {
    let parsed = feed_rs::parser::parse(body)?;

    let show_title = parsed
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(FetchError::MalformedFeed("show title"))?;

    let entry = parsed
        .entries
        .into_iter()
        .next()
        .ok_or(FetchError::MalformedFeed("entries"))?;

    if entry.id.trim().is_empty() {
        return Err(FetchError::MalformedFeed("entry guid"));
    }

    let episode_title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(FetchError::MalformedFeed("entry title"))?;

    let link = parsed
        .links
        .first()
        .and_then(|l| normalize_link(&l.href).ok())
        .unwrap_or_else(|| feed_url.to_string());

    let show_author = parsed
        .authors
        .first()
        .map(|a| a.name.clone())
        .filter(|name| !name.is_empty());
    let show_image = parsed
        .logo
        .map(|img| img.uri)
        .or_else(|| parsed.icon.map(|img| img.uri));

    let episode_link = entry.links.first().map(|l| l.href.clone());
    let episode_image = entry
        .media
        .iter()
        .find_map(|m| m.thumbnails.first())
        .map(|t| t.image.uri.clone());
    let episode_description = entry
        .summary
        .map(|s| clean_description(&s.content))
        .filter(|d| !d.is_empty());

    Ok(Episode {
        show_title,
        show_author,
        show_image,
        link,
        feed_url: feed_url.to_string(),
        guid: entry.id,
        episode_title,
        episode_link,
        episode_image,
        episode_description,
    })
}

/// Strips markup so a feed description reads as plain text.
pub fn clean_description(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    html_escape::decode_html_entities(stripped.as_ref())
        .trim()
        .to_string()
}
