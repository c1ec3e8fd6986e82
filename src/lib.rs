//! # grpcframe
//!
//! **grpcframe** recovers HTTP-router semantics on top of a transport that
//! exposes a single generic `Dispatch` remote call. The transport decodes
//! the wire envelope (an application-level URL, an HTTP-style method enum,
//! a structured body, and a query string); this crate does everything a
//! router normally would:
//!
//! - **[`router`]** - exact-match route resolution on `(url, method)` pairs
//! - **[`binder`]** - declarative argument binding from body/query against
//!   per-route parameter descriptors
//! - **[`middleware`]** - an ordered before/after hook pipeline (forward
//!   before, reverse after)
//! - **[`exception`]** - error-kind → response mapping with a guaranteed
//!   `Internal` fallback and double-fault containment
//! - **[`dispatcher`]** - the per-call orchestration tying it together
//!
//! ## Runtime
//!
//! Handlers run in [`may`] coroutines, one per registration, fed by MPSC
//! channels. The dispatcher blocks on a per-call reply channel, so blocking
//! and suspending handlers share a single invocation contract. Stack size is
//! configurable via the `GRPCFRAME_STACK_SIZE` environment variable.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use grpcframe::{
//!     Dispatcher, FieldType, HandlerDescriptor, Method, ModelSchema,
//!     NoopTransport, RequestEnvelope, TracingMiddleware,
//! };
//! use serde_json::json;
//!
//! let signup = ModelSchema::new("Signup")
//!     .field("username", FieldType::String)
//!     .field("age", FieldType::Integer);
//!
//! let dispatcher = unsafe {
//!     Dispatcher::builder()
//!         .route(
//!             "/signup",
//!             &[Method::Post],
//!             HandlerDescriptor::new().body_model("user", signup),
//!             |args| Ok(json!({ "status": "ok" })),
//!         )
//!         .middleware(Arc::new(TracingMiddleware))
//!         .build()
//! };
//!
//! let req = RequestEnvelope::new("/signup", Method::Post)
//!     .with_body(json!({"username": "a", "age": 3}).as_object().unwrap().clone());
//! let res = dispatcher.dispatch(req, &NoopTransport).unwrap();
//! assert_eq!(res.status_code, 200);
//! ```
//!
//! ## Startup vs. serving
//!
//! All registration goes through [`DispatcherBuilder`]; `build()` spawns the
//! handler coroutines and freezes the route table, pipeline, and exception
//! bindings. Shared state is read-only from then on — middleware hooks
//! thread the request/response explicitly and hold no per-call fields, so
//! concurrent dispatches never interfere.

pub mod binder;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod exception;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod schema;
pub mod transport;
pub mod typed;

pub use binder::{bind, BoundArgs, BindingKind, HandlerDescriptor, ParamSpec};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use envelope::{Method, RequestEnvelope, ResponseEnvelope};
pub use error::{DispatchError, ErrorKind};
pub use exception::{DoubleFault, ExceptionMapper};
pub use logging::init_tracing;
pub use middleware::{Middleware, MiddlewarePipeline, TracingMiddleware};
pub use router::{Route, RouteTable};
pub use schema::{FieldType, ModelSchema};
pub use transport::{NoopTransport, TransportContext};
pub use typed::TypedHandler;
