pub mod discord;
pub mod types;

pub use discord::DiscordNotifier;

use crate::podcast::Episode;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notifier is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned HTTP {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Delivery boundary for new-episode announcements.
#[async_trait]
pub trait Notify {
    /// Delivers one announcement to one destination channel.
    async fn send(&self, episode: &Episode, channel_id: &str) -> Result<(), NotifyError>;

    /// True when this episode is already the most recently delivered one for
    /// its feed. The scheduler skips delivery for such an episode but still
    /// marks it posted.
    async fn is_latest(&self, episode: &Episode) -> bool;
}
