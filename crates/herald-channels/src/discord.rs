//! Discord gateway — REST API v10 message delivery.
//!
//! Implements the outbound half of the platform boundary: session check,
//! channel resolution, and message send. Realtime gateway events and
//! reconnect handling live with the embedding application, not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use herald_core::error::{HeraldError, Result};
use herald_core::traits::{ChannelTarget, ChatGateway};

pub use herald_core::config::DiscordConfig;

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord bot gateway.
pub struct DiscordChannel {
    client: reqwest::Client,
    connected: bool,
}

impl DiscordChannel {
    pub fn new(config: &DiscordConfig) -> Self {
        let client = reqwest::Client::builder()
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                if let Ok(auth) = format!("Bot {}", config.bot_token).parse() {
                    h.insert("Authorization", auth);
                }
                if let Ok(agent) = "Herald/0.1".parse() {
                    h.insert("User-Agent", agent);
                }
                h
            })
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            connected: false,
        }
    }

    /// Get current bot info.
    pub async fn get_me(&self) -> Result<DiscordUser> {
        let response = self
            .client
            .get(format!("{API_BASE}/users/@me"))
            .send()
            .await
            .map_err(|e| HeraldError::Channel(format!("getMe failed: {e}")))?;

        if !response.status().is_success() {
            return Err(HeraldError::Channel(format!(
                "getMe returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| HeraldError::Channel(format!("Invalid getMe response: {e}")))
    }

    /// Look up a channel. None when it does not exist or the bot cannot
    /// see it.
    pub async fn get_channel(&self, channel_id: i64) -> Option<DiscordChannelInfo> {
        let response = self
            .client
            .get(format!("{API_BASE}/channels/{channel_id}"))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => resp.json().await.ok(),
            Ok(resp) => {
                tracing::debug!("Channel {channel_id} lookup returned {}", resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("Channel {channel_id} lookup failed: {e}");
                None
            }
        }
    }

    /// Post a message to a channel.
    pub async fn post_message(&self, channel_id: i64, content: &str) -> Result<()> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages");
        let body = serde_json::json!({ "content": content });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| HeraldError::Channel(format!("Discord send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(HeraldError::Channel(format!("Discord {status}: {text}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatGateway for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn connect(&mut self) -> Result<()> {
        let me = self.get_me().await?;
        tracing::info!("Discord bot: {} ({})", me.username, me.id);
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn resolve_channel(&self, channel_id: i64) -> Option<ChannelTarget> {
        let info = self.get_channel(channel_id).await?;
        Some(ChannelTarget {
            id: channel_id,
            name: info.name,
        })
    }

    async fn send_message(&self, target: &ChannelTarget, text: &str) -> Result<()> {
        self.post_message(target.id, text).await
    }
}

// --- Discord API Types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub bot: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordChannelInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub channel_type: u8,
    pub name: Option<String>,
    pub guild_id: Option<String>,
}
