//! Fatal error reporting
//!
//! Startup failures are either something the operator can act on (a bad key
//! format, an unreachable Redis) or an internal fault. The first kind prints
//! its own message; the second prints the failing operation and keeps the
//! detail at debug level.

/// Error that knows whether its message is meant for the operator
///
/// When `is_user_actionable()` is true, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<String>;
}

/// Log a fatal error at the detail level its kind calls for
///
/// # Examples
/// ```rust,no_run
/// # use caplist::core::error_handling::log_error_with_context;
/// # use caplist::app::StartupError;
/// # use caplist::app::cli::ConfigError;
/// let err = StartupError::Config(ConfigError::MissingFormat);
/// log_error_with_context(&err, "Loading configuration");
/// // Logs: "FATAL: no key format given (use --format ...)"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
