//! Message trait for publishable types.

/// A marker trait for values that can travel through the bus.
///
/// Messages are classified solely by their exact type. They are shared
/// between handlers running on different threads, so they must be
/// `Send + Sync + 'static`. Every such type is a message, which is what lets
/// a handler's error be republished without extra ceremony.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug)]
/// struct OrderPlaced { id: u64 }
///
/// bus.publish(OrderPlaced { id: 42 });
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "Messages are shared across handler tasks and must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Message for T {}
