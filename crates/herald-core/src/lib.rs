//! # Herald Core
//!
//! Shared foundation for the Herald workspace: the unified error type,
//! configuration loading, and the `ChatGateway` boundary trait that the
//! scheduler core consumes. Everything platform-specific lives behind that
//! trait in `herald-channels`.

pub mod config;
pub mod error;
pub mod traits;

pub use config::HeraldConfig;
pub use error::{HeraldError, Result};
pub use traits::{ChannelTarget, ChatGateway};
