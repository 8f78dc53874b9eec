//! Message and error handlers.
//!
//! Both handler kinds are shared callables. Cloning a handler shares the
//! callable, and two handlers are "the same" only when they share it; two
//! handlers built from identical closures are distinct. The bus relies on
//! this identity to unsubscribe.

use crate::{failure::Failure, message::Message};
use futures::{FutureExt, future::BoxFuture};
use std::{any::type_name, fmt, future::Future, sync::Arc};

/// The future a [`Handler`] produces for one message.
pub type HandlerFuture = BoxFuture<'static, Result<(), Failure>>;

type HandlerFn<T> = dyn Fn(Arc<T>) -> HandlerFuture + Send + Sync;

/// A handler for messages of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let on_order = Handler::new(|order: &OrderPlaced| {
///     reserve_stock(order.id)?;
///     Ok(())
/// });
/// bus.subscribe(&on_order)?;
/// ```
pub struct Handler<T: Message> {
    inner: Arc<HandlerFn<T>>,
}

impl<T: Message> Handler<T> {
    /// Wraps a synchronous closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<(), Failure> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self {
            inner: Arc::new(move |message: Arc<T>| {
                let f = Arc::clone(&f);
                async move { (*f)(&message) }.boxed()
            }),
        }
    }

    /// Wraps an async closure.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Failure>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |message: Arc<T>| f(message).boxed()),
        }
    }

    /// Produces the handler's future for `message`.
    pub fn call(&self, message: Arc<T>) -> HandlerFuture {
        (self.inner)(message)
    }

    /// Returns `true` if both handlers share the same callable.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Message> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Message> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("message", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// A callback receiving the failure of a handler.
#[derive(Clone)]
pub struct ErrorHandler {
    inner: Arc<dyn Fn(Failure) + Send + Sync>,
}

impl ErrorHandler {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Failure) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invokes the callback.
    pub fn call(&self, failure: Failure) {
        (self.inner)(failure)
    }

    /// Returns `true` if both error handlers share the same callable.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler").finish_non_exhaustive()
    }
}
