use actix_web::{get, post, web, HttpResponse};

use super::types::{FeedChannelsQuery, FeedChannelsResponse, TrackedCountResponse};
use crate::{
    errors::{AppError, AppResult},
    podcast::normalize_link,
    RqStore,
};

/// Channels subscribed to a feed url, in subscription order.
#[get("/channels")]
pub async fn get_feed_channels(
    store: RqStore,
    query: web::Query<FeedChannelsQuery>,
) -> AppResult<HttpResponse> {
    let url = normalize_link(&query.url)
        .map_err(|_| AppError::invalid_input("url", "Invalid feed URL format"))?;

    let channels = store.channels_for_feed(&url)?;
    Ok(HttpResponse::Ok().json(FeedChannelsResponse { url, channels }))
}

/// Number of feed urls tracked in the dedup cache.
#[get("/tracked")]
pub async fn get_tracked_count(store: RqStore) -> AppResult<HttpResponse> {
    let tracked_feeds = store.tracked_feed_count()?;
    Ok(HttpResponse::Ok().json(TrackedCountResponse { tracked_feeds }))
}

/// Forgets every announced episode so the next poll cycle re-announces the
/// latest ones. Feeds stay tracked.
#[post("/posted/reset")]
pub async fn reset_posted(store: RqStore) -> AppResult<HttpResponse> {
    store.reset_all()?;
    log::info!("Posted state reset for all feeds");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Posted state cleared for all feeds"
    })))
}
