//! # herald-std
//!
//! Standard implementations for the Herald message bus.
//!
//! This crate provides:
//! - **The bus**: [`Bus`], [`BusBuilder`], [`SubscribeOptions`]
//! - **Execution**: [`TokioExecutor`] with named runtime domains
//! - **Error handlers**: [`LoggingErrorHandler`]
//! - **Testing utilities**: recording and counting handlers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use herald_core;

// Modules
pub mod bus;
pub mod executor;
pub mod logging;
pub mod testing;

mod registry;

pub use bus::{Bus, BusBuilder, SubscribeOptions};
pub use executor::{TokioExecutor, TokioExecutorBuilder};
pub use logging::LoggingErrorHandler;
