//! # herald - In-Process Message Bus
//!
//! `herald` lets independent components exchange typed messages without
//! knowing about each other. Components subscribe handlers to a message type;
//! publishing a value runs every handler subscribed to exactly that type, each
//! on its own task, each isolated from the others' failures.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[derive(Debug)]
//! struct OrderPlaced { id: u64 }
//!
//! let bus = Bus::new();
//! let on_order = Handler::new(|order: &OrderPlaced| {
//!     println!("order {}", order.id);
//!     Ok(())
//! });
//!
//! bus.subscribe(&on_order)?;
//! bus.publish(OrderPlaced { id: 42 });
//! ```
//!
//! ## Failures
//!
//! Handlers return `Result<(), Failure>`. A failure, or a panic, never reaches
//! the publisher. It goes to the error handler given at subscribe time, or,
//! without one, is republished as a message of the error's own type:
//!
//! ```rust,ignore
//! bus.subscribe(&Handler::new(|e: &InsufficientStock| {
//!     tracing::warn!(%e, "stock problem");
//!     Ok(())
//! }))?;
//! ```
//!
//! ## Where handlers run
//!
//! Handlers run on an [`Executor`]. The default [`TokioExecutor`] spawns onto
//! the publisher's tokio runtime, or onto a shared runtime started on first use
//! when the publisher has none; named [`ExecutionDomain`]s route individual
//! subscriptions to other runtimes.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use herald_core::{
    // Handlers
    ErrorHandler,
    // Execution
    ExecutionDomain,
    Executor,
    Failure,
    Handler,
    HandlerFuture,
    HandlerPanicked,
    HeraldError,
    // Message
    Message,
    Work,
};

pub use herald_std::{
    Bus, BusBuilder, LoggingErrorHandler, SubscribeOptions, TokioExecutor, TokioExecutorBuilder,
};

/// Testing utilities.
pub mod testing {
    pub use herald_std::testing::{CountingHandler, RecordingHandler, failing_handler};
}

/// Prelude module - common imports for Herald.
///
/// # Usage
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bus, ErrorHandler, ExecutionDomain, Failure, Handler, HeraldError, Message,
        SubscribeOptions,
    };
}
