//! Middleware trait and pipeline.
//!
//! Hooks are pure transformations over an explicit context value: a
//! before-hook takes the current request and returns the request the next
//! stage sees; an after-hook does the same for the response. Middleware
//! instances are shared read-only across all concurrent calls and must not
//! hold per-request state in instance fields — the envelope threads through
//! the hook arguments instead.

use std::sync::Arc;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::DispatchError;

/// A before/after hook pair applied around every handler invocation.
///
/// Either hook may fail; a failure transitions the call to exception
/// handling and the remaining hooks of that phase are skipped.
pub trait Middleware: Send + Sync {
    fn before(&self, req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        Ok(req)
    }

    fn after(&self, res: ResponseEnvelope) -> Result<ResponseEnvelope, DispatchError> {
        Ok(res)
    }
}

/// Ordered chain of middleware, frozen at build time.
///
/// Before-hooks run in registration order; after-hooks run in *reverse*
/// registration order, so the last-registered middleware wraps innermost.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    #[must_use]
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self { middlewares }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Thread the request through every before-hook in registration order.
    pub fn run_before(&self, mut req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        for mw in &self.middlewares {
            req = mw.before(req)?;
        }
        Ok(req)
    }

    /// Thread the response through every after-hook in reverse registration
    /// order.
    pub fn run_after(&self, mut res: ResponseEnvelope) -> Result<ResponseEnvelope, DispatchError> {
        for mw in self.middlewares.iter().rev() {
            res = mw.after(res)?;
        }
        Ok(res)
    }
}
