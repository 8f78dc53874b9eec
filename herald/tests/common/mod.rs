#![allow(dead_code)]

use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Test Message Types
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct OrderPlaced {
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderCancelled {
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("insufficient stock for order {order}")]
pub struct InsufficientStock {
    pub order: u64,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("audit log unavailable")]
pub struct AuditUnavailable;

// ============================================================================
// Helpers
// ============================================================================

/// Upper bound for anything that should eventually happen.
pub const DELIVERY: Duration = Duration::from_secs(2);

/// How long to wait before concluding that something did not happen.
pub const QUIET: Duration = Duration::from_millis(100);

/// Route bus logs to the test output. Set `RUST_LOG=herald_std=trace` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
