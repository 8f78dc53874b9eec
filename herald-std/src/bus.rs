//! The message bus.
//!
//! [`Bus`] ties the subscriber registry to an [`Executor`]. Publishing takes
//! a snapshot of the subscriptions for the exact message type, releases the
//! registry lock, and asks the executor to run each handler. The publisher
//! never waits for handler bodies and never sees their failures.
//!
//! # Failure routing
//!
//! A failing handler is reported to the error handler given at subscribe
//! time. Without one, the failure is republished on the same bus as a message
//! of the error's own type. Handlers reached through that republication run
//! without failure routing, so a failing error subscriber is discarded rather
//! than republished again.

use crate::{
    executor::TokioExecutor,
    registry::{Payload, Registry, Subscription},
};
use herald_core::{ErrorHandler, ExecutionDomain, Executor, Failure, Handler, HeraldError, Message};
use once_cell::sync::Lazy;
use std::{
    any::{TypeId, type_name},
    fmt,
    sync::{Arc, Weak},
};

static GLOBAL: Lazy<Bus> = Lazy::new(Bus::new);

/// Per-subscription settings.
#[derive(Debug, Clone, Default)]
pub struct SubscribeOptions {
    error_handler: Option<ErrorHandler>,
    domain: Option<ExecutionDomain>,
}

impl SubscribeOptions {
    /// Default options: bus error routing, executor's default domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report handler failures to `error_handler` instead of republishing them.
    pub fn with_error_handler(mut self, error_handler: ErrorHandler) -> Self {
        self.error_handler = Some(error_handler);
        self
    }

    /// Run the handler on `domain`.
    pub fn on_domain(mut self, domain: impl Into<ExecutionDomain>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

struct Inner {
    registry: Registry,
    executor: Arc<dyn Executor>,
}

/// An in-process publish/subscribe bus.
///
/// Cloning a `Bus` yields another handle to the same registry.
///
/// # Example
///
/// ```rust,ignore
/// let bus = Bus::new();
/// let on_order = Handler::new(|order: &OrderPlaced| {
///     println!("order {}", order.id);
///     Ok(())
/// });
///
/// bus.subscribe(&on_order)?;
/// bus.publish(OrderPlaced { id: 42 });
/// bus.unsubscribe(&on_order);
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    /// A bus running handlers on a default [`TokioExecutor`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a bus.
    pub fn builder() -> BusBuilder {
        BusBuilder::new()
    }

    /// The process-wide bus, built on first access and never torn down.
    ///
    /// Prefer constructing a [`Bus`] and passing it to the components that
    /// need it; this accessor exists for code that cannot be handed one.
    pub fn global() -> &'static Bus {
        &GLOBAL
    }

    /// Subscribe `handler` to messages of type `T`.
    ///
    /// Failures are republished as messages of the error's type.
    pub fn subscribe<T: Message>(&self, handler: &Handler<T>) -> Result<(), HeraldError> {
        self.subscribe_with(handler, SubscribeOptions::default())
    }

    /// Subscribe `handler` to messages of type `T` with explicit options.
    ///
    /// Subscribing the same handler twice yields two independent
    /// subscriptions.
    ///
    /// # Errors
    ///
    /// [`HeraldError::InvalidArgument`] if the options name a domain the
    /// executor does not know. The registry is left untouched.
    pub fn subscribe_with<T: Message>(
        &self,
        handler: &Handler<T>,
        options: SubscribeOptions,
    ) -> Result<(), HeraldError> {
        if let Some(domain) = &options.domain {
            if !self.inner.executor.supports(domain) {
                return Err(HeraldError::unknown_domain(domain));
            }
        }

        let error_handler = options
            .error_handler
            .unwrap_or_else(|| self.unhandled_error_notifier());
        self.inner.registry.add(Subscription::new(
            handler.clone(),
            error_handler,
            options.domain,
        ));
        tracing::trace!(message_type = type_name::<T>(), "subscribed");
        Ok(())
    }

    /// Remove one subscription of `handler` to messages of type `T`.
    ///
    /// Returns `false`, and does nothing else, when `handler` was not
    /// subscribed.
    pub fn unsubscribe<T: Message>(&self, handler: &Handler<T>) -> bool {
        let removed = self.inner.registry.remove(handler);
        tracing::trace!(message_type = type_name::<T>(), removed, "unsubscribed");
        removed
    }

    /// Publish `message` to every subscriber of exactly type `T`.
    ///
    /// Returns once every handler invocation has been handed to the
    /// executor.
    pub fn publish<T: Message>(&self, message: T) {
        let payload: Payload = Arc::new(message);
        self.dispatch(TypeId::of::<T>(), type_name::<T>(), payload, true);
    }

    /// Number of active subscriptions for messages of type `T`.
    pub fn subscriber_count<T: Message>(&self) -> usize {
        self.inner.registry.len_of(TypeId::of::<T>())
    }

    fn dispatch(
        &self,
        message_type: TypeId,
        type_label: &'static str,
        payload: Payload,
        route_failures: bool,
    ) {
        let subscriptions = self.inner.registry.snapshot(message_type);
        tracing::trace!(
            message_type = type_label,
            subscribers = subscriptions.len(),
            "publishing"
        );

        for subscription in subscriptions {
            let result = subscription.dispatch(
                Arc::clone(&payload),
                self.inner.executor.as_ref(),
                route_failures,
            );
            if let Err(error) = result {
                tracing::warn!(%error, message_type = type_label, "handler not scheduled");
            }
        }
    }

    /// The error handler bound to subscriptions that did not supply one.
    fn unhandled_error_notifier(&self) -> ErrorHandler {
        // Weak: the registry owning this handler lives inside `inner`.
        let bus = Arc::downgrade(&self.inner);
        ErrorHandler::new(move |failure: Failure| notify_unhandled(&bus, failure))
    }
}

fn notify_unhandled(bus: &Weak<Inner>, failure: Failure) {
    let Some(inner) = bus.upgrade() else {
        return;
    };
    tracing::debug!(
        error = %failure,
        error_type = failure.type_name(),
        "republishing unhandled handler failure"
    );
    Bus { inner }.dispatch(
        failure.message_type(),
        failure.type_name(),
        failure.payload(),
        false,
    );
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("empty", &self.inner.registry.is_empty())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Bus`].
#[derive(Default)]
pub struct BusBuilder {
    executor: Option<Arc<dyn Executor>>,
}

impl BusBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run handlers on `executor` instead of a default [`TokioExecutor`].
    pub fn executor<E: Executor>(mut self, executor: E) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Build the bus.
    pub fn build(self) -> Bus {
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(TokioExecutor::new()));
        Bus {
            inner: Arc::new(Inner {
                registry: Registry::default(),
                executor,
            }),
        }
    }
}

impl fmt::Debug for BusBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusBuilder")
            .field("custom_executor", &self.executor.is_some())
            .finish()
    }
}
