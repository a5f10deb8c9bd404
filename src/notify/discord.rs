use super::types::{CreateMessage, DiscordConfig, Embed, EmbedAuthor, EmbedFooter, EmbedImage};
use super::{Notify, NotifyError};
use crate::podcast::Episode;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;

/// Announces episodes to Discord channels through the bot REST API.
///
/// Remembers the last guid delivered per feed url so the scheduler can skip
/// resending an episode it has already announced, e.g. right after the
/// posted state has been reset.
pub struct DiscordNotifier {
    client: Client,
    config: DiscordConfig,
    last_delivered: Mutex<HashMap<String, String>>,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Self {
        DiscordNotifier {
            client: Client::new(),
            config,
            last_delivered: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(DiscordConfig::from_env())
    }

    fn build_message(episode: &Episode) -> CreateMessage {
        let embed = Embed {
            title: episode.episode_title.clone(),
            description: episode.episode_description.clone(),
            url: episode
                .episode_link
                .clone()
                .or_else(|| Some(episode.link.clone())),
            author: Some(EmbedAuthor {
                name: episode.show_title.clone(),
                url: Some(episode.link.clone()),
                icon_url: episode.show_image.clone(),
            }),
            thumbnail: episode
                .episode_image
                .clone()
                .or_else(|| episode.show_image.clone())
                .map(|url| EmbedImage { url }),
            footer: episode
                .show_author
                .clone()
                .map(|text| EmbedFooter { text }),
        };
        CreateMessage {
            embeds: vec![embed],
        }
    }
}

#[async_trait]
impl Notify for DiscordNotifier {
    async fn send(&self, episode: &Episode, channel_id: &str) -> Result<(), NotifyError> {
        if self.config.bot_token.is_empty() {
            return Err(NotifyError::NotConfigured("bot token is empty"));
        }

        let message = Self::build_message(episode);
        let response = self
            .client
            .post(self.config.create_message_url(channel_id))
            .header("Authorization", format!("Bot {}", self.config.bot_token))
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status, body });
        }

        let mut last = self.last_delivered.lock().unwrap();
        last.insert(episode.feed_url.clone(), episode.guid.clone());
        Ok(())
    }

    async fn is_latest(&self, episode: &Episode) -> bool {
        let last = self.last_delivered.lock().unwrap();
        last.get(&episode.feed_url)
            .map_or(false, |guid| guid == &episode.guid)
    }
}
