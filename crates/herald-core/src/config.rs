//! Herald configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Discord channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Scheduler loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between due-checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Path to the notifications database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    60
}

fn default_db_path() -> PathBuf {
    HeraldConfig::home_dir().join("notifications.db")
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            enabled: default_true(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            db_path: default_db_path(),
        }
    }
}

impl HeraldConfig {
    /// Load config from the default path (~/.herald/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::HeraldError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::HeraldError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HeraldError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Herald's state directory (~/.herald).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".herald")
    }

    /// DISCORD_TOKEN env var wins over an empty configured token.
    pub fn apply_env(&mut self) {
        if self.discord.bot_token.is_empty()
            && let Ok(token) = std::env::var("DISCORD_TOKEN")
        {
            self.discord.bot_token = token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.scheduler.poll_interval_secs, 60);
        assert!(config.discord.enabled);
        assert!(config.discord.bot_token.is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: HeraldConfig = toml::from_str(
            r#"
            [discord]
            bot_token = "abc123"

            [scheduler]
            poll_interval_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.discord.bot_token, "abc123");
        assert_eq!(config.scheduler.poll_interval_secs, 5);
        // db_path falls back to the serde default
        assert!(config.scheduler.db_path.ends_with("notifications.db"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = HeraldConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: HeraldConfig = toml::from_str(&text).unwrap();
        assert_eq!(
            parsed.scheduler.poll_interval_secs,
            config.scheduler.poll_interval_secs
        );
    }
}
