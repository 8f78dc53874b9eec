//! Tokio-backed execution.
//!
//! Each unit of work is spawned as its own task. The task catches the
//! work's error or panic and hands it to the failure callback, so nothing
//! ever reaches the runtime's panic handling or the caller of `run`.

use futures::FutureExt;
use herald_core::{
    ErrorHandler, ExecutionDomain, Executor, Failure, HandlerPanicked, HeraldError, Work,
};
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
};
use tokio::runtime::{Builder, Handle, Runtime};

/// Shared runtime for work submitted from outside any runtime, built on first use.
static FALLBACK: Lazy<Option<Runtime>> = Lazy::new(|| {
    Builder::new_multi_thread()
        .thread_name("herald-worker")
        .enable_all()
        .build()
        .map_err(|error| tracing::error!(%error, "failed to start fallback runtime"))
        .ok()
});

fn fallback_handle() -> Option<Handle> {
    FALLBACK.as_ref().map(|runtime| runtime.handle().clone())
}

/// An [`Executor`] spawning work onto tokio runtimes.
///
/// Without a domain, work runs on the caller's current runtime. Outside any
/// runtime it runs on the configured default handle, or else on a shared
/// multi-thread runtime owned by the crate. Named domains map to dedicated
/// runtime handles.
///
/// # Example
///
/// ```rust,ignore
/// let executor = TokioExecutor::builder()
///     .domain("io", io_runtime.handle().clone())
///     .build();
/// let bus = Bus::builder().executor(executor).build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokioExecutor {
    default: Option<Handle>,
    domains: HashMap<ExecutionDomain, Handle>,
}

impl TokioExecutor {
    /// An executor running on the caller's current runtime, or on the shared
    /// fallback runtime when there is none.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring an executor.
    pub fn builder() -> TokioExecutorBuilder {
        TokioExecutorBuilder::new()
    }

    fn resolve(&self, domain: Option<&ExecutionDomain>) -> Result<Handle, HeraldError> {
        match domain {
            Some(domain) => self
                .domains
                .get(domain)
                .cloned()
                .ok_or_else(|| HeraldError::unknown_domain(domain)),
            None => Handle::try_current()
                .ok()
                .or_else(|| self.default.clone())
                .or_else(fallback_handle)
                .ok_or(HeraldError::NoRuntime),
        }
    }
}

impl Executor for TokioExecutor {
    fn run(
        &self,
        work: Work,
        on_failure: Option<ErrorHandler>,
        domain: Option<&ExecutionDomain>,
    ) -> Result<(), HeraldError> {
        let handle = self.resolve(domain)?;
        handle.spawn(supervise(work, on_failure));
        Ok(())
    }

    fn supports(&self, domain: &ExecutionDomain) -> bool {
        self.domains.contains_key(domain)
    }
}

/// Drives `work` to completion and routes its failure.
async fn supervise(work: Work, on_failure: Option<ErrorHandler>) {
    let failure = match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(())) => return,
        Ok(Err(failure)) => failure,
        Err(panic) => Failure::new(HandlerPanicked::from_payload(&*panic)),
    };

    let Some(on_failure) = on_failure else {
        tracing::debug!(
            error = %failure,
            error_type = failure.type_name(),
            "discarding unhandled handler failure"
        );
        return;
    };

    // The callback runs user code too; contain it the same way.
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| on_failure.call(failure))) {
        tracing::debug!(
            panic = %HandlerPanicked::from_payload(&*panic),
            "error handler panicked"
        );
    }
}

/// Builder for [`TokioExecutor`].
#[derive(Debug, Default)]
pub struct TokioExecutorBuilder {
    default: Option<Handle>,
    domains: HashMap<ExecutionDomain, Handle>,
}

impl TokioExecutorBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime used for domain-less work submitted from outside any runtime.
    pub fn default_handle(mut self, handle: Handle) -> Self {
        self.default = Some(handle);
        self
    }

    /// Register a named domain.
    pub fn domain(mut self, name: impl Into<ExecutionDomain>, handle: Handle) -> Self {
        self.domains.insert(name.into(), handle);
        self
    }

    /// Build the executor.
    pub fn build(self) -> TokioExecutor {
        TokioExecutor {
            default: self.default,
            domains: self.domains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, time::Duration};
    use tokio::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    #[error("out of stock")]
    struct OutOfStock;

    fn succeed() -> Work {
        async { Ok(()) }.boxed()
    }

    fn fail() -> Work {
        async { Err(Failure::new(OutOfStock)) }.boxed()
    }

    fn explode(message: &'static str) -> Result<(), Failure> {
        panic!("{message}")
    }

    fn report_to(tx: mpsc::UnboundedSender<Failure>) -> ErrorHandler {
        ErrorHandler::new(move |failure| {
            let _ = tx.send(failure);
        })
    }

    #[tokio::test]
    async fn test_error_reaches_failure_callback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = TokioExecutor::new();

        executor.run(fail(), Some(report_to(tx)), None).unwrap();

        let failure = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(failure.is::<OutOfStock>());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_handler_panicked() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = TokioExecutor::new();

        executor.run(async { explode("boom") }.boxed(), Some(report_to(tx)), None).unwrap();

        let failure = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let panicked = failure.downcast_ref::<HandlerPanicked>().unwrap();
        assert_eq!(panicked.message, "boom");
    }

    #[tokio::test]
    async fn test_success_does_not_call_failure_callback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let executor = TokioExecutor::new();

        executor
            .run(
                async move {
                    let _ = done_tx.send(());
                    Ok::<(), Failure>(())
                }
                .boxed(),
                Some(report_to(tx)),
                None,
            )
            .unwrap();

        done_rx.await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_without_callback_is_discarded() {
        let executor = TokioExecutor::new();
        executor.run(async { explode("ignored") }.boxed(), None, None).unwrap();
        executor.run(fail(), None, None).unwrap();

        // The runtime keeps serving work after both failures.
        let (tx, rx) = tokio::sync::oneshot::channel();
        executor
            .run(
                async move {
                    let _ = tx.send(());
                    Ok::<(), Failure>(())
                }
                .boxed(),
                None,
                None,
            )
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_panicking_failure_callback_is_contained() {
        let executor = TokioExecutor::new();
        let on_failure = ErrorHandler::new(|_| panic!("callback"));
        executor.run(fail(), Some(on_failure), None).unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        executor
            .run(
                async move {
                    let _ = tx.send(());
                    Ok::<(), Failure>(())
                }
                .boxed(),
                None,
                None,
            )
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_fallback_runtime_outside_runtime() {
        assert!(Handle::try_current().is_err());
        let executor = TokioExecutor::new();

        let (tx, rx) = std::sync::mpsc::channel();
        executor
            .run(
                async move {
                    let _ = tx.send(thread::current().name().map(str::to_owned));
                    Ok::<(), Failure>(())
                }
                .boxed(),
                None,
                None,
            )
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(name.as_deref(), Some("herald-worker"));
    }

    #[test]
    fn test_failure_routed_on_fallback_runtime() {
        let executor = TokioExecutor::new();
        let (tx, rx) = std::sync::mpsc::channel();
        let on_failure = ErrorHandler::new(move |failure| {
            let _ = tx.send(failure.is::<OutOfStock>());
        });

        executor.run(fail(), Some(on_failure), None).unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn test_default_handle_used_outside_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let executor = TokioExecutor::builder()
            .default_handle(runtime.handle().clone())
            .build();

        let (tx, rx) = std::sync::mpsc::channel();
        executor
            .run(
                async move {
                    let _ = tx.send(thread::current().id());
                    Ok::<(), Failure>(())
                }
                .boxed(),
                None,
                None,
            )
            .unwrap();

        let worker = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_ne!(worker, thread::current().id());
    }

    #[test]
    fn test_named_domain_runs_on_its_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("herald-io")
            .build()
            .unwrap();
        let executor = Arc::new(
            TokioExecutor::builder()
                .domain("io", runtime.handle().clone())
                .build(),
        );
        let io = ExecutionDomain::from("io");
        assert!(executor.supports(&io));

        let (tx, rx) = std::sync::mpsc::channel();
        executor
            .run(
                async move {
                    let _ = tx.send(thread::current().name().map(str::to_owned));
                    Ok::<(), Failure>(())
                }
                .boxed(),
                None,
                Some(&io),
            )
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(name.as_deref(), Some("herald-io"));
    }

    #[test]
    fn test_unknown_domain_is_rejected() {
        let executor = TokioExecutor::new();
        let gpu = ExecutionDomain::from("gpu");
        assert!(!executor.supports(&gpu));

        let err = executor.run(succeed(), None, Some(&gpu)).unwrap_err();
        assert!(matches!(err, HeraldError::InvalidArgument { name: "domain", .. }));
    }
}
