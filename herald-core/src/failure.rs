//! Captured handler failures.

use crate::message::Message;
use std::{
    any::{Any, TypeId, type_name},
    error::Error as StdError,
    fmt,
    sync::Arc,
};
use thiserror::Error;

/// The error a handler is reported as when its body panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler panicked: {message}")]
pub struct HandlerPanicked {
    /// The panic message, or `"unknown panic"` for non-string payloads.
    pub message: String,
}

impl HandlerPanicked {
    /// Builds the error from a payload caught by `catch_unwind`.
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self { message }
    }
}

/// A failure raised by a handler body.
///
/// `Failure` keeps the concrete type of the error it was built from, so the
/// bus can republish it as a message of exactly that type. Any
/// `std::error::Error + Send + Sync + 'static` converts into it, which lets
/// handlers use `?` directly.
///
/// `Failure` deliberately does not implement `std::error::Error` itself; use
/// [`Failure::error`] to reach the underlying error.
#[derive(Clone)]
pub struct Failure {
    message_type: TypeId,
    type_name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
    error: Arc<dyn StdError + Send + Sync>,
}

impl Failure {
    /// Captures an error, remembering its concrete type.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let error = Arc::new(error);
        Self {
            message_type: TypeId::of::<E>(),
            type_name: type_name::<E>(),
            payload: error.clone(),
            error,
        }
    }

    /// Type identity of the captured error.
    pub fn message_type(&self) -> TypeId {
        self.message_type
    }

    /// Type name of the captured error, for logging.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The captured error as a type-erased message.
    pub fn payload(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.payload)
    }

    /// The captured error.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }

    /// Returns `true` if the captured error is an `E`.
    pub fn is<E: Message>(&self) -> bool {
        self.message_type == TypeId::of::<E>()
    }

    /// Borrows the captured error as `E`.
    pub fn downcast_ref<E: Message>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// Shares the captured error as `E`.
    pub fn downcast<E: Message>(&self) -> Option<Arc<E>> {
        self.payload().downcast::<E>().ok()
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Failure::new(error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("type", &self.type_name)
            .field("error", &self.error)
            .finish()
    }
}
