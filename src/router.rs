//! Route table: exact-match resolution of `(url, method)` pairs.
//!
//! Because every call arrives through the transport's single generic
//! `Dispatch` entry point, the table is the only source of truth for which
//! routes exist. Lookup is an exact match on the path string and method —
//! no patterns or wildcards.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binder::HandlerDescriptor;
use crate::envelope::Method;
use crate::error::DispatchError;
use crate::schema::ModelSchema;

/// A registered association between a `(url, method)` pair and a handler.
#[derive(Debug, Clone)]
pub struct Route {
    /// Registered path (exact string, no trailing normalization).
    pub url: String,
    /// Method this table entry answers.
    pub method: Method,
    /// Name keying the handler's channel in the dispatcher.
    pub handler_name: String,
    /// Ordered parameter declarations for the argument binder.
    pub descriptor: HandlerDescriptor,
    /// Optional schema the handler's raw return value is coerced against.
    pub response_schema: Option<ModelSchema>,
}

/// Immutable-after-startup mapping from `(url, method)` to [`Route`].
///
/// Populated only through [`DispatcherBuilder`](crate::dispatcher::DispatcherBuilder)
/// during the registration phase; read-only while serving.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<(String, Method), Arc<Route>>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one table entry.
    ///
    /// Duplicate registration for the same `(url, method)` overwrites the
    /// previous entry — last registration wins, never an error.
    pub fn insert(&mut self, route: Route) {
        let key = (route.url.clone(), route.method);
        if let Some(previous) = self.routes.insert(key, Arc::new(route)) {
            warn!(
                url = %previous.url,
                method = %previous.method,
                old_handler = %previous.handler_name,
                "Route re-registered - previous handler replaced"
            );
        }
    }

    /// Resolve a request to its route.
    ///
    /// Exact-match lookup; a miss is a `NotFound` error.
    pub fn resolve(&self, url: &str, method: Method) -> Result<Arc<Route>, DispatchError> {
        match self.routes.get(&(url.to_string(), method)) {
            Some(route) => {
                debug!(url, %method, handler = %route.handler_name, "Route resolved");
                Ok(Arc::clone(route))
            }
            None => Err(DispatchError::not_found(format!(
                "no route for {method} {url}"
            ))),
        }
    }

    /// Number of `(url, method)` entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
