use serde::Serialize;
use std::env;

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub api_base_url: String,
}

impl DiscordConfig {
    pub fn from_env() -> Self {
        let bot_token = env::var("PC_DISCORD_TOKEN").unwrap_or_default();
        let api_base_url = env::var("PC_DISCORD_API_URL")
            .unwrap_or_else(|_| "https://discord.com/api/v10".to_string());

        Self {
            bot_token,
            api_base_url,
        }
    }

    pub fn create_message_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", self.api_base_url, channel_id)
    }
}

#[derive(Debug, Serialize)]
pub struct CreateMessage {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}
