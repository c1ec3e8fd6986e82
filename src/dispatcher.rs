//! Dispatcher: per-call orchestration of routing, binding, middleware,
//! handler invocation, and exception mapping.
//!
//! Handlers run in `may` coroutines, one per registration, consuming calls
//! from an MPSC channel and answering on a per-call reply channel. The
//! dispatcher blocks on the reply, so blocking and suspending handlers share
//! one invocation contract: coroutine scheduling makes suspension
//! transparent to the caller.
//!
//! Registration happens through [`DispatcherBuilder`] during an explicit
//! startup phase; [`DispatcherBuilder::build`] freezes the route table,
//! middleware pipeline, and exception bindings into an immutable
//! [`Dispatcher`]. Nothing is mutated once serving begins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::binder::{self, BoundArgs, HandlerDescriptor};
use crate::envelope::{Method, RequestEnvelope, ResponseEnvelope};
use crate::error::{DispatchError, ErrorKind};
use crate::exception::{ErrorHandler, ExceptionMapper};
use crate::ids::RequestId;
use crate::middleware::{Middleware, MiddlewarePipeline};
use crate::router::{Route, RouteTable};
use crate::schema::ModelSchema;
use crate::transport::TransportContext;

/// Environment variable overriding the handler coroutine stack size.
/// Accepts decimal (`65536`) or hex (`0x10000`).
pub const STACK_SIZE_ENV: &str = "GRPCFRAME_STACK_SIZE";

const DEFAULT_STACK_SIZE: usize = 0x10000; // 64 KiB

fn handler_stack_size() -> usize {
    std::env::var(STACK_SIZE_ENV)
        .ok()
        .and_then(|v| {
            if let Some(hex) = v.strip_prefix("0x") {
                usize::from_str_radix(hex, 16).ok()
            } else {
                v.parse().ok()
            }
        })
        .unwrap_or(DEFAULT_STACK_SIZE)
}

/// One invocation sent to a handler coroutine.
pub struct HandlerCall {
    pub request_id: RequestId,
    pub args: BoundArgs,
    /// Per-call reply channel; the coroutine sends exactly one reply.
    pub reply_tx: mpsc::Sender<Result<Value, DispatchError>>,
}

/// Channel sender feeding one handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerCall>;

/// Application handler: bound arguments in, raw result value out.
pub type HandlerFn = Box<dyn Fn(&BoundArgs) -> Result<Value, DispatchError> + Send>;

/// Accumulates routes, middleware, and exception bindings during startup.
///
/// The builder is consumed by [`build`](Self::build), which spawns the
/// handler coroutines and freezes everything into a [`Dispatcher`]. Handlers
/// keep their identity: one registration spawns one coroutine, shared by
/// every method the registration names.
pub struct DispatcherBuilder {
    table: RouteTable,
    handlers: Vec<(String, HandlerFn)>,
    middlewares: Vec<Arc<dyn Middleware>>,
    exceptions: ExceptionMapper,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            handlers: Vec::new(),
            middlewares: Vec::new(),
            exceptions: ExceptionMapper::new(),
        }
    }

    /// Register a route for one or more methods.
    ///
    /// Each method expands to its own table entry; all entries share the one
    /// handler. Re-registering an existing `(url, method)` pair overwrites
    /// it (last registration wins).
    #[must_use]
    pub fn route<F>(
        self,
        url: &str,
        methods: &[Method],
        descriptor: HandlerDescriptor,
        handler: F,
    ) -> Self
    where
        F: Fn(&BoundArgs) -> Result<Value, DispatchError> + Send + 'static,
    {
        self.register_route(url, methods, descriptor, None, Box::new(handler))
    }

    /// Like [`route`](Self::route), with a response schema the handler's raw
    /// return value is validated/coerced against.
    #[must_use]
    pub fn route_with_schema<F>(
        self,
        url: &str,
        methods: &[Method],
        descriptor: HandlerDescriptor,
        response_schema: ModelSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(&BoundArgs) -> Result<Value, DispatchError> + Send + 'static,
    {
        self.register_route(url, methods, descriptor, Some(response_schema), Box::new(handler))
    }

    pub(crate) fn register_route(
        mut self,
        url: &str,
        methods: &[Method],
        descriptor: HandlerDescriptor,
        response_schema: Option<ModelSchema>,
        handler: HandlerFn,
    ) -> Self {
        // Registration index keeps handler names unique when the same url is
        // registered again for other methods.
        let handler_name = format!("{url}#{}", self.handlers.len());
        for &method in methods {
            self.table.insert(Route {
                url: url.to_string(),
                method,
                handler_name: handler_name.clone(),
                descriptor: descriptor.clone(),
                response_schema: response_schema.clone(),
            });
        }
        self.handlers.push((handler_name, handler));
        self
    }

    /// Append a middleware to the pipeline.
    ///
    /// Before-hooks run in the order added; after-hooks in reverse.
    #[must_use]
    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    /// Bind an exception handler to an error kind, replacing any default or
    /// earlier binding for that kind.
    #[must_use]
    pub fn exception_handler(mut self, kind: ErrorKind, handler: ErrorHandler) -> Self {
        self.exceptions.register(kind, handler);
        self
    }

    /// Spawn the handler coroutines and freeze the registrations.
    ///
    /// # Safety
    ///
    /// Calls `may::coroutine::Builder::spawn()`, which the `may` runtime
    /// marks unsafe. The caller must ensure the runtime is initialized and
    /// that handlers are safe to run concurrently. Handler panics are caught
    /// per call and surface as internal errors, so a panicking handler
    /// cannot kill its coroutine loop.
    pub unsafe fn build(self) -> Dispatcher {
        let stack_size = handler_stack_size();
        let mut senders: HashMap<String, HandlerSender> = HashMap::with_capacity(self.handlers.len());

        for (name, handler_fn) in self.handlers {
            let (tx, rx) = mpsc::channel::<HandlerCall>();
            let handler_name = name.clone();

            let spawn_result = coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(handler_name = %handler_name, stack_size, "Handler coroutine start");
                    for call in rx.iter() {
                        let reply_tx = call.reply_tx.clone();
                        let request_id = call.request_id;

                        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            handler_fn(&call.args)
                        }));
                        let reply = match outcome {
                            Ok(result) => result,
                            Err(panic) => {
                                error!(
                                    request_id = %request_id,
                                    handler_name = %handler_name,
                                    panic_message = ?panic,
                                    "Handler panicked"
                                );
                                Err(DispatchError::internal("handler panicked"))
                            }
                        };
                        let _ = reply_tx.send(reply);
                    }
                });

            match spawn_result {
                Ok(_) => {
                    senders.insert(name, tx);
                }
                Err(e) => {
                    // Calls routed to this handler will fail as internal
                    // errors through the closed-channel path.
                    error!(handler_name = %name, error = %e, "Failed to spawn handler coroutine");
                }
            }
        }

        info!(
            routes = self.table.len(),
            handlers = senders.len(),
            middlewares = self.middlewares.len(),
            "Dispatcher built"
        );

        Dispatcher {
            table: self.table,
            handlers: senders,
            pipeline: MiddlewarePipeline::new(self.middlewares),
            exceptions: self.exceptions,
        }
    }
}

/// Frozen dispatch engine: resolves, binds, runs middleware, invokes the
/// handler, and maps failures — always yielding exactly one
/// [`ResponseEnvelope`] per call, except after a double-fault.
pub struct Dispatcher {
    table: RouteTable,
    handlers: HashMap<String, HandlerSender>,
    pipeline: MiddlewarePipeline,
    exceptions: ExceptionMapper,
}

impl Dispatcher {
    /// Start accumulating registrations.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// The frozen route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Process one inbound call.
    ///
    /// Every failure in the Routing → AfterMiddleware chain is caught here
    /// and handed to the exception mapper; the mapped envelope is the
    /// response. Only a double-fault (the internal binding itself failing)
    /// escapes the envelope contract: it is signalled once through
    /// `transport` and the call returns `None`.
    pub fn dispatch(
        &self,
        req: RequestEnvelope,
        transport: &dyn TransportContext,
    ) -> Option<ResponseEnvelope> {
        let request_id = RequestId::new();
        let started = Instant::now();

        match self.process(request_id, req) {
            Ok(res) => {
                info!(
                    request_id = %request_id,
                    status = res.status_code,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Dispatch complete"
                );
                Some(res)
            }
            Err(err) => match self.exceptions.map(&err) {
                Ok(res) => {
                    info!(
                        request_id = %request_id,
                        status = res.status_code,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Dispatch complete (mapped error)"
                    );
                    Some(res)
                }
                Err(fault) => {
                    error!(
                        request_id = %request_id,
                        details = %fault.details,
                        "Double fault - escalating to transport"
                    );
                    transport.fail(&fault.details);
                    None
                }
            },
        }
    }

    /// Routing → Binding → BeforeMiddleware → Invoking → AfterMiddleware.
    fn process(
        &self,
        request_id: RequestId,
        req: RequestEnvelope,
    ) -> Result<ResponseEnvelope, DispatchError> {
        let route = self.table.resolve(req.path(), req.method)?;

        // Bound once, from the envelope as delivered by the transport;
        // before-hooks run afterwards and cannot affect binding.
        let args = binder::bind(&route.descriptor, &req.body, &req.query)?;

        // Handlers receive bound arguments, not the envelope; the request
        // value threaded through before-hooks is observed by the hooks only.
        self.pipeline.run_before(req)?;

        let raw = self.invoke(request_id, &route, args)?;

        let data = match &route.response_schema {
            Some(schema) => {
                let obj = raw.as_object().ok_or_else(|| {
                    DispatchError::validation("response does not match expected model")
                })?;
                Value::Object(schema.construct(obj).map_err(|err| {
                    DispatchError::validation(format!(
                        "response does not match expected model: {}",
                        err.message()
                    ))
                })?)
            }
            None => raw,
        };

        self.pipeline.run_after(ResponseEnvelope::ok(data))
    }

    /// Send the bound arguments to the handler coroutine and block on its
    /// reply. A closed channel (crashed coroutine or failed spawn) surfaces
    /// as an internal error.
    fn invoke(
        &self,
        request_id: RequestId,
        route: &Route,
        args: BoundArgs,
    ) -> Result<Value, DispatchError> {
        let tx = self.handlers.get(&route.handler_name).ok_or_else(|| {
            error!(
                request_id = %request_id,
                handler_name = %route.handler_name,
                "Handler not registered"
            );
            DispatchError::internal(format!("handler '{}' not registered", route.handler_name))
        })?;

        let (reply_tx, reply_rx) = mpsc::channel();
        let call = HandlerCall {
            request_id,
            args,
            reply_tx,
        };

        debug!(
            request_id = %request_id,
            handler_name = %route.handler_name,
            method = %route.method,
            url = %route.url,
            "Request dispatched to handler"
        );
        let start = Instant::now();

        tx.send(call).map_err(|_| {
            error!(
                request_id = %request_id,
                handler_name = %route.handler_name,
                "Handler channel closed"
            );
            DispatchError::internal(format!("handler '{}' is not accepting calls", route.handler_name))
        })?;

        let reply = reply_rx.recv().map_err(|_| {
            error!(
                request_id = %request_id,
                handler_name = %route.handler_name,
                "Handler reply channel closed before responding"
            );
            DispatchError::internal(format!("handler '{}' did not respond", route.handler_name))
        })?;

        debug!(
            request_id = %request_id,
            handler_name = %route.handler_name,
            latency_ms = start.elapsed().as_millis() as u64,
            ok = reply.is_ok(),
            "Handler reply received"
        );
        reply
    }
}
