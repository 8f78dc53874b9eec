//! Testing utilities for Herald.
//!
//! Handlers run on other tasks, so assertions about them have to wait. The
//! helpers here record what they receive and let a test await a count with a
//! deadline.
//!
//! - [`RecordingHandler`]: records every message it receives
//! - [`CountingHandler`]: counts invocations for any message type
//! - [`failing_handler`]: a handler that always fails with a given error

use herald_core::{Failure, Handler, Message};
use std::{
    error::Error as StdError,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::Notify;

// ============================================================================
// Recording Handler
// ============================================================================

/// Records all messages it receives.
///
/// Every clone shares the same record and the same [`Handler`], so
/// unsubscribing through any clone removes the subscription.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::<OrderPlaced>::new();
/// bus.subscribe(&recorder.handler())?;
/// bus.publish(OrderPlaced { id: 42 });
///
/// assert!(recorder.wait_for(1, Duration::from_secs(1)).await);
/// assert_eq!(recorder.messages()[0].id, 42);
/// ```
pub struct RecordingHandler<T: Message + Clone> {
    messages: Arc<Mutex<Vec<T>>>,
    notify: Arc<Notify>,
    handler: Handler<T>,
}

impl<T: Message + Clone> RecordingHandler<T> {
    /// Create a new recording handler.
    pub fn new() -> Self {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let notify = Arc::new(Notify::new());
        let handler = {
            let messages = messages.clone();
            let notify = notify.clone();
            Handler::new(move |message: &T| {
                messages.lock().unwrap().push(message.clone());
                notify.notify_waiters();
                Ok(())
            })
        };
        Self {
            messages,
            notify,
            handler,
        }
    }

    /// The handler to subscribe.
    pub fn handler(&self) -> Handler<T> {
        self.handler.clone()
    }

    /// Get a clone of the recorded messages.
    pub fn messages(&self) -> Vec<T> {
        self.messages.lock().unwrap().clone()
    }

    /// Get the number of recorded messages.
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Wait until at least `count` messages were recorded.
    ///
    /// Returns `false` if `within` elapsed first.
    pub async fn wait_for(&self, count: usize, within: Duration) -> bool {
        wait_until(&self.notify, within, || self.count() >= count).await
    }
}

impl<T: Message + Clone> Default for RecordingHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Message + Clone> Clone for RecordingHandler<T> {
    fn clone(&self) -> Self {
        Self {
            messages: self.messages.clone(),
            notify: self.notify.clone(),
            handler: self.handler.clone(),
        }
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// Counts invocations.
///
/// Unlike [`RecordingHandler`] it does not need `Clone` messages, and one
/// counter can back handlers for several message types.
#[derive(Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new handler for `T` feeding this counter.
    ///
    /// Each call returns a distinct handler.
    pub fn handler<T: Message>(&self) -> Handler<T> {
        let counter = self.clone();
        Handler::new(move |_: &T| {
            counter.increment();
            Ok(())
        })
    }

    /// Count one invocation by hand.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until the count reaches `count`.
    ///
    /// Returns `false` if `within` elapsed first.
    pub async fn wait_for(&self, count: usize, within: Duration) -> bool {
        wait_until(&self.notify, within, || self.count() >= count).await
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// A handler for `T` that always fails with the error `make` builds.
pub fn failing_handler<T, E, F>(make: F) -> Handler<T>
where
    T: Message,
    E: StdError + Send + Sync + 'static,
    F: Fn(&T) -> E + Send + Sync + 'static,
{
    Handler::new(move |message: &T| Err(Failure::new(make(message))))
}

async fn wait_until(notify: &Notify, within: Duration, done: impl Fn() -> bool) -> bool {
    let wait = async {
        loop {
            // Register before checking so a notification in between is kept.
            let notified = notify.notified();
            if done() {
                return;
            }
            notified.await;
        }
    };
    tokio::time::timeout(within, wait).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("rejected {0}")]
    struct Rejected(u32);

    #[tokio::test]
    async fn test_recording_handler_records() {
        let recorder = RecordingHandler::<u32>::new();
        recorder.handler().call(Arc::new(4)).await.unwrap();

        assert!(recorder.wait_for(1, Duration::from_millis(10)).await);
        assert_eq!(recorder.messages(), vec![4]);
        assert!(recorder.handler().same(&recorder.clone().handler()));
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let counter = CountingHandler::new();
        assert!(!counter.wait_for(1, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_counting_handler_across_types() {
        let counter = CountingHandler::new();
        counter.handler::<u32>().call(Arc::new(1)).await.unwrap();
        counter
            .handler::<String>()
            .call(Arc::new("a".into()))
            .await
            .unwrap();
        assert_eq!(counter.count(), 2);
        assert!(!counter.handler::<u32>().same(&counter.handler::<u32>()));
    }

    #[tokio::test]
    async fn test_failing_handler() {
        let handler = failing_handler(|value: &u32| Rejected(*value));
        let failure = handler.call(Arc::new(9)).await.unwrap_err();
        assert_eq!(failure.downcast_ref::<Rejected>().unwrap().0, 9);
    }
}
