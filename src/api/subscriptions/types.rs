use actix_web::web;
use serde::{Deserialize, Serialize};

use crate::models::feed::Feed;

#[derive(Debug, Deserialize)]
pub struct SubscriptionCreate {
    pub url: String,
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub feed: Feed,
    pub channel_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionPath {
    pub feed_id: String,
    pub channel_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChannelPath {
    pub channel_id: String,
}

pub type RqSubPath = web::Path<SubscriptionPath>;
pub type RqChannelPath = web::Path<ChannelPath>;
