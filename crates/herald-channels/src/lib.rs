//! # Herald Channels
//! Chat-platform gateway implementations.

pub mod discord;

pub use discord::{DiscordChannel, DiscordConfig};
