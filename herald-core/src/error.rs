//! Error types for Herald.
//!
//! Only errors raised synchronously at the call site live here. Failures of
//! handler bodies never reach the caller; they are captured as
//! [`Failure`](crate::Failure) values at the execution boundary.

use crate::executor::ExecutionDomain;
use thiserror::Error;

/// Errors returned synchronously by bus and executor operations.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// An argument was rejected before any state was touched.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// No async runtime could be reached or started to schedule the work on.
    #[error("no async runtime available to run work")]
    NoRuntime,
}

impl HeraldError {
    /// The execution domain is not known to the executor.
    pub fn unknown_domain(domain: &ExecutionDomain) -> Self {
        HeraldError::InvalidArgument {
            name: "domain",
            reason: format!("unknown execution domain `{domain}`"),
        }
    }
}
