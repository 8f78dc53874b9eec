//! Logging error handler.

use herald_core::{ErrorHandler, Failure};

/// An error handler that logs failures instead of republishing them.
///
/// # Example
///
/// ```rust,ignore
/// bus.subscribe_with(
///     &handler,
///     SubscribeOptions::new().with_error_handler(LoggingErrorHandler::new("billing").into()),
/// )?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LoggingErrorHandler {
    label: &'static str,
}

impl LoggingErrorHandler {
    /// Log failures under `label`.
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }

    /// Log one failure.
    pub fn log(&self, failure: &Failure) {
        tracing::error!(
            subscriber = self.label,
            error = %failure,
            error_type = failure.type_name(),
            "handler failed"
        );
    }
}

impl From<LoggingErrorHandler> for ErrorHandler {
    fn from(logger: LoggingErrorHandler) -> Self {
        ErrorHandler::new(move |failure| logger.log(&failure))
    }
}
