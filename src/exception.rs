//! Exception mapper: converts raised errors into response envelopes.
//!
//! Lookup is by the error's exact [`ErrorKind`]. A miss, or a matched
//! handler that itself fails, falls back to the `Internal` binding; if that
//! binding also fails the call is a [`DoubleFault`] and the pipeline must
//! not recurse further.

use std::collections::HashMap;
use std::fmt;

use tracing::{error, warn};

use crate::envelope::ResponseEnvelope;
use crate::error::{DispatchError, ErrorKind};

/// Handler converting one error into a response envelope.
pub type ErrorHandler =
    Box<dyn Fn(&DispatchError) -> Result<ResponseEnvelope, DispatchError> + Send + Sync>;

/// Failure of the fallback `Internal` binding itself; escalated to the
/// transport instead of the normal response path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleFault {
    pub details: String,
}

impl fmt::Display for DoubleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "double fault: {}", self.details)
    }
}

impl std::error::Error for DoubleFault {}

/// Kind → handler table, constructed once at startup and read-only while
/// serving.
///
/// The `Internal` binding is held separately so it always exists: defaults
/// for [`ErrorKind::NotFound`] (404) and [`ErrorKind::Validation`] (400) are
/// pre-registered and, like the internal binding, can be replaced but never
/// removed.
pub struct ExceptionMapper {
    handlers: HashMap<ErrorKind, ErrorHandler>,
    internal: ErrorHandler,
}

impl ExceptionMapper {
    #[must_use]
    pub fn new() -> Self {
        let mut mapper = Self {
            handlers: HashMap::new(),
            internal: Box::new(|_| Ok(ResponseEnvelope::error(500, "Internal Server Error"))),
        };
        mapper.register(
            ErrorKind::NotFound,
            Box::new(|err| Ok(ResponseEnvelope::error(err.default_status(), err.message()))),
        );
        mapper.register(
            ErrorKind::Validation,
            Box::new(|err| Ok(ResponseEnvelope::error(err.default_status(), err.message()))),
        );
        mapper
    }

    /// Bind a handler to an error kind, replacing any previous binding.
    pub fn register(&mut self, kind: ErrorKind, handler: ErrorHandler) {
        if kind == ErrorKind::Internal {
            self.internal = handler;
        } else {
            self.handlers.insert(kind, handler);
        }
    }

    /// Map an error to its response envelope.
    ///
    /// The mapped error is logged here, at the point of mapping; a
    /// [`DoubleFault`] is logged by the caller at escalation.
    pub fn map(&self, err: &DispatchError) -> Result<ResponseEnvelope, DoubleFault> {
        warn!(kind = %err.kind(), message = err.message(), "Mapping error to response");

        let matched = if err.kind() == ErrorKind::Internal {
            Some(&self.internal)
        } else {
            self.handlers.get(&err.kind())
        };

        if let Some(handler) = matched {
            match handler(err) {
                Ok(res) => return Ok(res),
                Err(handler_err) => {
                    error!(
                        kind = %err.kind(),
                        handler_error = %handler_err,
                        "Exception handler failed - falling back to internal binding"
                    );
                }
            }
        }

        // One fallback attempt, never more: the internal binding answers for
        // unregistered kinds and for failed handlers.
        let internal_err = DispatchError::internal(err.message());
        (self.internal)(&internal_err).map_err(|fault| DoubleFault {
            details: format!("internal error handler failed: {fault} (original: {err})"),
        })
    }
}

impl Default for ExceptionMapper {
    fn default() -> Self {
        Self::new()
    }
}
