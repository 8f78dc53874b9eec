//! The execution seam.
//!
//! An [`Executor`] decides where and how a unit of work runs. The bus hands
//! it one unit per matching subscription and never waits for the outcome.

use crate::{error::HeraldError, failure::Failure, handler::ErrorHandler};
use futures::future::BoxFuture;
use std::{borrow::Cow, fmt};

/// A unit of work: one handler invocation for one message.
pub type Work = BoxFuture<'static, Result<(), Failure>>;

/// Names the concurrency domain a unit of work must run on.
///
/// What a name maps to is up to the executor; for
/// `TokioExecutor` it is a runtime handle registered under that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionDomain(Cow<'static, str>);

impl ExecutionDomain {
    /// Create a domain selector.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The domain name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ExecutionDomain {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ExecutionDomain {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Runs units of work asynchronously and reports their failures.
///
/// # Contract
///
/// - `run` returns once the work is scheduled. It never waits for the work
///   and never returns its outcome.
/// - If the work fails (returns `Err` or panics), `on_failure` is invoked
///   exactly once with the underlying cause. A panic is reported as
///   [`HandlerPanicked`](crate::HandlerPanicked).
/// - Without `on_failure`, the failure is discarded. It must not crash the
///   process or surface through the executor's own fault channel.
/// - `domain` selects where the work runs. An unknown domain is rejected
///   with [`HeraldError::InvalidArgument`].
pub trait Executor: Send + Sync + 'static {
    /// Schedule `work`.
    fn run(
        &self,
        work: Work,
        on_failure: Option<ErrorHandler>,
        domain: Option<&ExecutionDomain>,
    ) -> Result<(), HeraldError>;

    /// Returns `true` if `domain` can be selected on this executor.
    ///
    /// The bus checks this when a subscription names a domain. Executors
    /// without named domains accept every selector.
    fn supports(&self, _domain: &ExecutionDomain) -> bool {
        true
    }
}
