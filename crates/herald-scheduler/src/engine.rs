//! Scheduler engine — the periodic loop that delivers due notifications.
//!
//! One tick: capture `now`, snapshot the store, dispatch every due record,
//! delete each immediately after its attempt. The loop is a single spawned
//! task that awaits the tick body inline, so ticks never overlap; a slow
//! dispatch delays the next tick instead of stacking it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use herald_core::error::Result;

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::store::NotificationStore;

/// Executes one poll-and-dispatch pass over the store.
pub struct SchedulerEngine {
    store: Arc<NotificationStore>,
    dispatcher: Dispatcher,
}

impl SchedulerEngine {
    pub fn new(store: Arc<NotificationStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Run a single tick. Returns the processed records and their outcomes.
    ///
    /// `now` is captured once so every due-comparison in the tick uses the
    /// same instant. Each due record is deleted right after its dispatch
    /// attempt, whatever the outcome; a storage failure aborts the rest of
    /// the tick without touching records whose dispatch was not attempted.
    pub async fn run_tick(&self) -> Result<Vec<(i64, DispatchOutcome)>> {
        let now = Utc::now();
        let records = self.store.list_all()?;

        let mut processed = Vec::new();
        for record in records {
            if !record.is_due(now) {
                continue;
            }

            let outcome = self.dispatcher.send(record.channel_id, &record.message).await;
            match &outcome {
                DispatchOutcome::Delivered => {
                    tracing::info!(
                        "Sent notification {} to channel {}",
                        record.id,
                        record.channel_id
                    );
                }
                DispatchOutcome::TargetMissing => {
                    tracing::warn!(
                        "Dropping notification {}: channel {} not found",
                        record.id,
                        record.channel_id
                    );
                }
                DispatchOutcome::SendFailed(detail) => {
                    tracing::warn!(
                        "Dropping notification {}: send to channel {} failed: {detail}",
                        record.id,
                        record.channel_id
                    );
                }
            }

            self.store.delete(record.id)?;
            processed.push((record.id, outcome));
        }

        Ok(processed)
    }
}

/// Owns the periodic loop. Start it once the gateway is connected; a second
/// start (e.g. a reconnect firing the ready signal again) is a logged no-op.
pub struct Scheduler {
    engine: Arc<SchedulerEngine>,
    period: Duration,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(engine: Arc<SchedulerEngine>, period: Duration) -> Self {
        Self {
            engine,
            period,
            running: AtomicBool::new(false),
        }
    }

    /// Spawn the loop. Returns false if it was already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Scheduler already running; ignoring start");
            return false;
        }

        let engine = Arc::clone(&self.engine);
        let period = self.period;
        tokio::spawn(async move {
            tracing::info!("Scheduler started (check every {}s)", period.as_secs());
            let mut interval = tokio::time::interval(period);
            // A tick that outlives the period delays the next one.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = engine.run_tick().await {
                    tracing::error!("Tick aborted: {e}");
                }
            }
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use herald_core::error::{HeraldError, Result};
    use herald_core::traits::{ChannelTarget, ChatGateway};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Programmable gateway that records every send.
    struct RecordingGateway {
        sent: Mutex<Vec<(i64, String)>>,
        missing_channel: Option<i64>,
        failing_channel: Option<i64>,
        send_delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RecordingGateway {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                missing_channel: None,
                failing_channel: None,
                send_delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn sent(&self) -> Vec<(i64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatGateway for RecordingGateway {
        fn name(&self) -> &str {
            "recording"
        }

        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn resolve_channel(&self, channel_id: i64) -> Option<ChannelTarget> {
            (self.missing_channel != Some(channel_id)).then(|| ChannelTarget::new(channel_id))
        }

        async fn send_message(&self, target: &ChannelTarget, text: &str) -> Result<()> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing_channel == Some(target.id) {
                return Err(HeraldError::Channel("boom".into()));
            }
            self.sent.lock().unwrap().push((target.id, text.to_string()));
            Ok(())
        }
    }

    fn engine_with(gateway: Arc<RecordingGateway>) -> (Arc<NotificationStore>, SchedulerEngine) {
        let store = Arc::new(NotificationStore::open_in_memory().unwrap());
        let engine = SchedulerEngine::new(Arc::clone(&store), Dispatcher::new(gateway));
        (store, engine)
    }

    #[tokio::test]
    async fn test_due_record_dispatched_once_and_deleted() {
        let gateway = Arc::new(RecordingGateway::new());
        let (store, engine) = engine_with(Arc::clone(&gateway));

        let now = Utc::now();
        let due = store
            .create(1, now - ChronoDuration::seconds(5), "go", 10)
            .unwrap();
        store
            .create(1, now + ChronoDuration::hours(1), "later", 10)
            .unwrap();

        let processed = engine.run_tick().await.unwrap();
        assert_eq!(processed, vec![(due, DispatchOutcome::Delivered)]);
        assert_eq!(gateway.sent(), vec![(1, "go".to_string())]);

        // The future record is untouched; the due one is gone.
        let remaining = store.list_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "later");

        // A second tick finds nothing due and re-sends nothing.
        assert!(engine.run_tick().await.unwrap().is_empty());
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_future_records_left_untouched() {
        let gateway = Arc::new(RecordingGateway::new());
        let (store, engine) = engine_with(Arc::clone(&gateway));

        store
            .create(1, Utc::now() + ChronoDuration::minutes(1), "soon", 10)
            .unwrap();

        assert!(engine.run_tick().await.unwrap().is_empty());
        assert!(gateway.sent().is_empty());
        assert_eq!(store.pending_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_target_still_deleted_not_retried() {
        let mut gateway = RecordingGateway::new();
        gateway.missing_channel = Some(77);
        let gateway = Arc::new(gateway);
        let (store, engine) = engine_with(Arc::clone(&gateway));

        let id = store
            .create(77, Utc::now() - ChronoDuration::seconds(1), "orphan", 10)
            .unwrap();

        let processed = engine.run_tick().await.unwrap();
        assert_eq!(processed, vec![(id, DispatchOutcome::TargetMissing)]);
        assert!(gateway.sent().is_empty());
        assert_eq!(store.pending_count().unwrap(), 0);

        // Next tick has nothing to retry.
        assert!(engine.run_tick().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_still_deleted() {
        let mut gateway = RecordingGateway::new();
        gateway.failing_channel = Some(5);
        let gateway = Arc::new(gateway);
        let (store, engine) = engine_with(gateway);

        let id = store
            .create(5, Utc::now() - ChronoDuration::seconds(1), "doomed", 10)
            .unwrap();

        let processed = engine.run_tick().await.unwrap();
        assert!(matches!(
            processed.as_slice(),
            [(got, DispatchOutcome::SendFailed(_))] if *got == id
        ));
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ticks_never_overlap() {
        // Dispatch takes 3x the poll period; the loop must serialize.
        let mut gateway = RecordingGateway::new();
        gateway.send_delay = Duration::from_millis(60);
        let gateway = Arc::new(gateway);
        let (store, engine) = engine_with(Arc::clone(&gateway));

        let now = Utc::now();
        for i in 0..4 {
            store
                .create(i, now - ChronoDuration::seconds(10), "tick", 1)
                .unwrap();
        }

        let scheduler = Scheduler::new(Arc::new(engine), Duration::from_millis(20));
        assert!(scheduler.start());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(gateway.sent().len(), 4);
        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let gateway = Arc::new(RecordingGateway::new());
        let (_store, engine) = engine_with(gateway);
        let scheduler = Scheduler::new(Arc::new(engine), Duration::from_secs(60));

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());
    }
}
