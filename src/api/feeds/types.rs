use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FeedChannelsQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FeedChannelsResponse {
    pub url: String,
    pub channels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackedCountResponse {
    pub tracked_feeds: usize,
}
