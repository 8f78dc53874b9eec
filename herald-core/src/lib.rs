//! # herald-core
//!
//! Core types for the Herald message bus.
//!
//! This crate carries no runtime and no registry. It defines the vocabulary
//! shared by the bus and by anything that plugs into it:
//!
//! - [`Message`] - the marker for publishable values
//! - [`Handler`] / [`ErrorHandler`] - shared callables with pointer identity
//! - [`Failure`] - a captured handler error that remembers its concrete type
//! - [`Executor`] - the seam deciding where a unit of work runs
//!
//! # Error Types
//!
//! - [`HeraldError`] - synchronous errors returned at the call site
//! - [`HandlerPanicked`] - the error a panicking handler is reported as

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod executor;
mod failure;
mod handler;
mod message;

// Re-exports
pub use error::HeraldError;
pub use executor::{ExecutionDomain, Executor, Work};
pub use failure::{Failure, HandlerPanicked};
pub use handler::{ErrorHandler, Handler, HandlerFuture};
pub use message::Message;
