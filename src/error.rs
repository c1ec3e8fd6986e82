//! Error taxonomy for the dispatch engine.
//!
//! Every failure inside the Routing → AfterMiddleware chain is expressed as a
//! [`DispatchError`] tagged with an [`ErrorKind`]. The kind is the lookup key
//! the [`ExceptionMapper`](crate::exception::ExceptionMapper) uses to select
//! a response handler; handlers are registered per kind rather than per
//! concrete error type.

use std::fmt;

/// Tag identifying which exception binding handles an error.
///
/// The three built-in kinds always have default bindings; applications extend
/// the taxonomy with named [`ErrorKind::App`] kinds registered at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No route registered for the request's `(url, method)` pair.
    NotFound,
    /// Argument binding or response-schema coercion failed.
    Validation,
    /// Unexpected failure: handler panic, unregistered error, channel loss.
    Internal,
    /// Application-defined kind, matched by its registered name.
    App(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => f.write_str("not_found"),
            ErrorKind::Validation => f.write_str("validation"),
            ErrorKind::Internal => f.write_str("internal"),
            ErrorKind::App(name) => write!(f, "app:{name}"),
        }
    }
}

/// An error raised anywhere in the per-request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    kind: ErrorKind,
    message: String,
}

impl DispatchError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Application-defined error, dispatched to the handler registered for
    /// `kind` (falling back to the internal binding when none is).
    #[must_use]
    pub fn app(kind: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::App(kind), message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Default status code for this kind, used when no specific binding
    /// overrides it. App kinds default to 500 until a binding says otherwise.
    #[must_use]
    pub fn default_status(&self) -> u16 {
        match self.kind {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Internal | ErrorKind::App(_) => 500,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for DispatchError {}
