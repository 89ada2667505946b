//! The chat-platform boundary consumed by the scheduler core.

use async_trait::async_trait;

use crate::error::Result;

/// Opaque handle to a resolved delivery target.
///
/// Produced by [`ChatGateway::resolve_channel`] and passed back to
/// [`ChatGateway::send_message`]; the core never inspects it beyond logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub id: i64,
    /// Display name, when the platform provides one.
    pub name: Option<String>,
}

impl ChannelTarget {
    pub fn new(id: i64) -> Self {
        Self { id, name: None }
    }
}

/// Outbound capability of a chat platform connection.
///
/// `connect` returning Ok is the "connection ready" signal: callers start
/// the scheduler loop after it, and only once. Session management,
/// reconnects, and rate-limit backoff belong to the implementation.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Channel name, e.g. "discord".
    fn name(&self) -> &str;

    /// Validate the session with the platform.
    async fn connect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Resolve a channel id to a live target. None when the channel does
    /// not exist or is not visible to the bot.
    async fn resolve_channel(&self, channel_id: i64) -> Option<ChannelTarget>;

    /// Deliver `text` to a resolved target. The error detail is an opaque
    /// diagnostic string to callers.
    async fn send_message(&self, target: &ChannelTarget, text: &str) -> Result<()>;
}
