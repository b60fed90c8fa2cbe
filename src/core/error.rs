//! Unified error handling for pagegate
//!
//! Every stage of the dispatch pipeline reports failures through
//! [`DispatchError`]. None of them are recovered from inside the dispatcher:
//! an error aborts the current dispatch and is handed back to the caller.

use std::fmt;

use super::registry::HandlerId;

/// Unified error types for the dispatcher
#[derive(Debug)]
pub enum DispatchError {
    /// No handler exists for the page after trying the unqualified form and
    /// the whole module search path
    Resolution {
        page: String,
        searched: Vec<HandlerId>,
    },

    /// Neither the application nor the framework header is registered
    HeaderResolution { template: String },

    /// A `checkPage` hook failed instead of returning a name
    Hook { hook: String, message: String },

    /// A page handler failed while being built, processed or rendered
    Page { handler: String, message: String },

    /// Configuration-related errors
    Configuration(String),

    /// Rejected input (page names, admin requests)
    Validation(String),

    /// File and I/O errors
    Io(std::io::Error),

    /// Internal system errors
    Internal(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Resolution { page, searched } => {
                write!(f, "No handler found for page '{page}'")?;
                if !searched.is_empty() {
                    let tried: Vec<String> = searched.iter().map(|id| id.to_string()).collect();
                    write!(f, " (tried {})", tried.join(", "))?;
                }
                Ok(())
            }
            DispatchError::HeaderResolution { template } => {
                write!(f, "No header handler available for template '{template}'")
            }
            DispatchError::Hook { hook, message } => {
                write!(f, "Hook '{hook}' failed: {message}")
            }
            DispatchError::Page { handler, message } => {
                write!(f, "Page handler {handler} failed: {message}")
            }
            DispatchError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            DispatchError::Validation(msg) => write!(f, "Validation error: {msg}"),
            DispatchError::Io(err) => write!(f, "I/O error: {err}"),
            DispatchError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::Io(err)
    }
}

impl DispatchError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Resolution { .. } => "resolution",
            DispatchError::HeaderResolution { .. } => "header_resolution",
            DispatchError::Hook { .. } => "hook",
            DispatchError::Page { .. } => "page",
            DispatchError::Configuration(_) => "configuration",
            DispatchError::Validation(_) => "validation",
            DispatchError::Io(_) => "io",
            DispatchError::Internal(_) => "internal",
        }
    }

    /// Build a page handler error
    pub fn page(handler: impl fmt::Display, message: impl Into<String>) -> Self {
        DispatchError::Page {
            handler: handler.to_string(),
            message: message.into(),
        }
    }

    /// Build a hook error
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for dispatcher operations
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_context(self, context: &str) -> DispatchResult<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn with_context(self, context: &str) -> DispatchResult<T> {
        self.map_err(|e| DispatchError::Internal(format!("{context}: {e}")))
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::DispatchError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::DispatchError::Configuration(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::core::DispatchError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::DispatchError::Internal(format!($fmt, $($arg)*))
    };
}
