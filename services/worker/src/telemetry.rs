//! services/worker/src/telemetry.rs
//!
//! Logging setup shared by the service binaries.

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber at the given level.
pub fn init(level: Level) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
