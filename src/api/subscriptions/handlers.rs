use actix_web::{delete, get, post, web, HttpResponse};

use super::types::{RqChannelPath, RqSubPath, SubscriptionCreate, SubscriptionResponse};
use crate::{
    errors::{AppError, AppResult},
    fetch::{FeedFetch, RssFetcher},
    podcast::normalize_link,
    RqStore,
};

#[post("")]
pub async fn create_subscription(
    store: RqStore,
    sub_req: web::Json<SubscriptionCreate>,
) -> AppResult<HttpResponse> {
    if sub_req.channel_id.trim().is_empty() {
        return Err(AppError::invalid_input("channel_id", "Cannot be empty"));
    }

    let url = normalize_link(&sub_req.url)
        .map_err(|_| AppError::invalid_input("url", "Invalid feed URL format"))?;

    // The feed has to fetch and parse before it is tracked; this also gives
    // us the show title for the feed row.
    let episode = RssFetcher::new().fetch(&url).await?;

    let feed = store.subscribe(&url, &episode.show_title, &sub_req.channel_id)?;
    log::info!("Channel {} subscribed to feed {}", sub_req.channel_id, feed.id);

    Ok(HttpResponse::Ok().json(SubscriptionResponse {
        feed,
        channel_id: sub_req.channel_id.clone(),
    }))
}

#[get("/{channel_id}")]
pub async fn get_subscriptions(store: RqStore, path: RqChannelPath) -> AppResult<HttpResponse> {
    let feeds = store.feeds_for_channel(&path.channel_id)?;
    Ok(HttpResponse::Ok().json(feeds))
}

#[delete("/{feed_id}/{channel_id}")]
pub async fn delete_subscription(store: RqStore, path: RqSubPath) -> AppResult<HttpResponse> {
    if store.feed_by_id(&path.feed_id)?.is_none() {
        return Err(AppError::resource_not_found("Feed"));
    }

    let removed = store.unsubscribe(&path.feed_id, &path.channel_id)?;
    if !removed {
        return Err(AppError::resource_not_found("Subscription"));
    }

    log::info!("Channel {} unsubscribed from feed {}", path.channel_id, path.feed_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Subscription deleted successfully"
    })))
}
