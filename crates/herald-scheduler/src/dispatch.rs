//! Notification dispatch — one attempt through the gateway, outcome
//! classified, never propagated. No retries here; the scheduler deletes
//! after the attempt either way.

use std::sync::Arc;

use herald_core::traits::ChatGateway;

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The platform accepted the message.
    Delivered,
    /// The channel id did not resolve; no send was attempted.
    TargetMissing,
    /// Resolution succeeded but the send failed. The detail is an opaque
    /// diagnostic string from the gateway.
    SendFailed(String),
}

/// Delivers one notification to its target channel.
pub struct Dispatcher {
    gateway: Arc<dyn ChatGateway>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self { gateway }
    }

    /// Attempt delivery of `message` to `channel_id`. Any gateway failure
    /// ends up in the outcome; a bad target cannot crash the caller.
    pub async fn send(&self, channel_id: i64, message: &str) -> DispatchOutcome {
        let Some(target) = self.gateway.resolve_channel(channel_id).await else {
            return DispatchOutcome::TargetMissing;
        };

        match self.gateway.send_message(&target, message).await {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => DispatchOutcome::SendFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herald_core::error::{HeraldError, Result};
    use herald_core::traits::ChannelTarget;

    /// Gateway where channel 404 never resolves and channel 500 fails sends.
    struct FixtureGateway;

    #[async_trait]
    impl ChatGateway for FixtureGateway {
        fn name(&self) -> &str {
            "fixture"
        }

        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn resolve_channel(&self, channel_id: i64) -> Option<ChannelTarget> {
            (channel_id != 404).then(|| ChannelTarget::new(channel_id))
        }

        async fn send_message(&self, target: &ChannelTarget, _text: &str) -> Result<()> {
            if target.id == 500 {
                Err(HeraldError::Channel("rate limited".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_delivered() {
        let dispatcher = Dispatcher::new(Arc::new(FixtureGateway));
        assert_eq!(dispatcher.send(1, "hi").await, DispatchOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_target_missing_skips_send() {
        let dispatcher = Dispatcher::new(Arc::new(FixtureGateway));
        assert_eq!(
            dispatcher.send(404, "hi").await,
            DispatchOutcome::TargetMissing
        );
    }

    #[tokio::test]
    async fn test_send_failure_captured() {
        let dispatcher = Dispatcher::new(Arc::new(FixtureGateway));
        match dispatcher.send(500, "hi").await {
            DispatchOutcome::SendFailed(detail) => assert!(detail.contains("rate limited")),
            other => panic!("expected SendFailed, got {other:?}"),
        }
    }
}
