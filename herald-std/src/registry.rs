//! Subscriber registry.
//!
//! Subscriptions are bucketed by the `TypeId` of the message they accept.
//! A single mutex guards every bucket; it is held only to mutate a bucket or
//! to copy one out for dispatch, never while a handler runs.

use herald_core::{ErrorHandler, ExecutionDomain, Executor, Handler, HeraldError, Message};
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A type-erased message as it travels through dispatch.
pub(crate) type Payload = Arc<dyn Any + Send + Sync>;

/// One registered interest in messages of type `T`.
pub(crate) struct Subscription<T: Message> {
    handler: Handler<T>,
    error_handler: ErrorHandler,
    domain: Option<ExecutionDomain>,
}

impl<T: Message> Subscription<T> {
    pub(crate) fn new(
        handler: Handler<T>,
        error_handler: ErrorHandler,
        domain: Option<ExecutionDomain>,
    ) -> Self {
        Self {
            handler,
            error_handler,
            domain,
        }
    }
}

/// Object-safe view of a [`Subscription`], recovered by downcast.
pub(crate) trait ErasedSubscription: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Asks `executor` to run the handler for `message`.
    ///
    /// With `route_failures` unset, a failing handler is not reported to the
    /// subscription's error handler.
    fn dispatch(
        &self,
        message: Payload,
        executor: &dyn Executor,
        route_failures: bool,
    ) -> Result<(), HeraldError>;
}

impl<T: Message> ErasedSubscription for Subscription<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dispatch(
        &self,
        message: Payload,
        executor: &dyn Executor,
        route_failures: bool,
    ) -> Result<(), HeraldError> {
        let Ok(message) = message.downcast::<T>() else {
            // Buckets are keyed by `TypeId::of::<T>()`.
            tracing::error!(message_type = type_name::<T>(), "payload type mismatch");
            return Ok(());
        };

        let handler = self.handler.clone();
        let work = Box::pin(async move { handler.call(message).await });
        let on_failure = route_failures.then(|| self.error_handler.clone());
        executor.run(work, on_failure, self.domain.as_ref())
    }
}

type Entry = Arc<dyn ErasedSubscription>;

/// All active subscriptions of one bus.
#[derive(Default)]
pub(crate) struct Registry {
    buckets: Mutex<HashMap<TypeId, Vec<Entry>>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, Vec<Entry>>> {
        // Handlers never run under the lock, so a poisoned map is still whole.
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a subscription. Duplicates are kept.
    pub(crate) fn add<T: Message>(&self, subscription: Subscription<T>) {
        self.lock()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Arc::new(subscription));
    }

    /// Remove the first subscription for `T` sharing `handler`.
    ///
    /// Returns `false` when nothing matched.
    pub(crate) fn remove<T: Message>(&self, handler: &Handler<T>) -> bool {
        let key = TypeId::of::<T>();
        let mut buckets = self.lock();
        let Some(bucket) = buckets.get_mut(&key) else {
            return false;
        };

        let position = bucket.iter().position(|entry| {
            entry
                .as_any()
                .downcast_ref::<Subscription<T>>()
                .is_some_and(|subscription| subscription.handler.same(handler))
        });
        let Some(position) = position else {
            return false;
        };

        bucket.remove(position);
        if bucket.is_empty() {
            buckets.remove(&key);
        }
        true
    }

    /// Copy out the subscriptions for exactly `message_type`.
    pub(crate) fn snapshot(&self, message_type: TypeId) -> Vec<Entry> {
        self.lock()
            .get(&message_type)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn len_of(&self, message_type: TypeId) -> usize {
        self.lock().get(&message_type).map_or(0, Vec::len)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
