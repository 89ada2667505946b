//! # Herald Scheduler
//!
//! The scheduling and delivery core: a SQLite-durable queue of pending
//! notifications, a fixed-interval poll loop, and a dispatcher that pushes
//! due messages through the platform gateway.
//!
//! ## Delivery contract
//! At-most-once: each record is dispatched exactly once when due and then
//! deleted, whatever the outcome. A failed send is logged, never requeued,
//! so a permanently broken target costs one attempt instead of a retry
//! storm.
//!
//! ## Architecture
//! ```text
//! Commands (schedule / list / cancel)
//!   └── NotificationStore (SQLite, survives restarts)
//!         ▲
//! Scheduler (tokio interval, non-overlapping ticks)
//!   └── per tick: list due → Dispatcher::send → delete
//!                   ├── Delivered
//!                   ├── TargetMissing   (channel gone)
//!                   └── SendFailed(why) (platform refused)
//! ```

pub mod commands;
pub mod dispatch;
pub mod engine;
pub mod notification;
pub mod store;

pub use commands::{CommandError, Commands};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use engine::{Scheduler, SchedulerEngine};
pub use notification::Notification;
pub use store::NotificationStore;
