//! Tests for the middleware pipeline: hook ordering, value threading, and
//! hook-raised errors.

use std::sync::Arc;

use grpcframe::middleware::{Middleware, MiddlewarePipeline};
use grpcframe::{
    DispatchError, Dispatcher, HandlerDescriptor, Method, NoopTransport, RequestEnvelope,
    ResponseEnvelope,
};
use parking_lot::Mutex;
use serde_json::json;

mod common;

/// Records the order its hooks fire in a shared log.
struct Probe {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Middleware for Probe {
    fn before(&self, req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        self.log.lock().push(format!("before:{}", self.name));
        Ok(req)
    }

    fn after(&self, res: ResponseEnvelope) -> Result<ResponseEnvelope, DispatchError> {
        self.log.lock().push(format!("after:{}", self.name));
        Ok(res)
    }
}

#[test]
fn test_before_forward_after_reverse_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = MiddlewarePipeline::new(vec![
        Arc::new(Probe {
            name: "m1",
            log: log.clone(),
        }),
        Arc::new(Probe {
            name: "m2",
            log: log.clone(),
        }),
    ]);

    let req = RequestEnvelope::new("/x", Method::Get);
    pipeline.run_before(req).unwrap();
    pipeline.run_after(ResponseEnvelope::ok(json!({}))).unwrap();

    assert_eq!(
        *log.lock(),
        vec!["before:m1", "before:m2", "after:m2", "after:m1"]
    );
}

/// Rewrites the request url; the next hook must observe the new value.
struct Rewriter;

impl Middleware for Rewriter {
    fn before(&self, mut req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        req.url = format!("{}/rewritten", req.url);
        Ok(req)
    }
}

struct AssertRewritten;

impl Middleware for AssertRewritten {
    fn before(&self, req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        assert!(req.url.ends_with("/rewritten"));
        Ok(req)
    }
}

#[test]
fn test_before_hooks_thread_the_transformed_request() {
    let pipeline = MiddlewarePipeline::new(vec![Arc::new(Rewriter), Arc::new(AssertRewritten)]);
    let out = pipeline
        .run_before(RequestEnvelope::new("/orig", Method::Get))
        .unwrap();
    assert_eq!(out.url, "/orig/rewritten");
}

/// Stamps a marker message onto the outbound response.
struct Stamper;

impl Middleware for Stamper {
    fn after(&self, mut res: ResponseEnvelope) -> Result<ResponseEnvelope, DispatchError> {
        res.message = Some("successful".to_string());
        Ok(res)
    }
}

#[test]
fn test_after_hooks_transform_the_response() {
    common::setup();
    let dispatcher = unsafe {
        Dispatcher::builder()
            .route("/ping", &[Method::Get], HandlerDescriptor::new(), |_| {
                Ok(json!({"pong": true}))
            })
            .middleware(Arc::new(Stamper))
            .build()
    };

    let res = dispatcher
        .dispatch(RequestEnvelope::new("/ping", Method::Get), &NoopTransport)
        .unwrap();
    assert_eq!(res.status_code, 200);
    assert_eq!(res.message.as_deref(), Some("successful"));
}

/// Fails every request before it reaches the handler.
struct Rejecting;

impl Middleware for Rejecting {
    fn before(&self, _req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        Err(DispatchError::app("rejected", "nope"))
    }
}

#[test]
fn test_before_hook_error_goes_to_exception_mapper() {
    common::setup();
    let dispatcher = unsafe {
        Dispatcher::builder()
            .route("/ping", &[Method::Get], HandlerDescriptor::new(), |_| {
                panic!("handler must not run");
            })
            .middleware(Arc::new(Rejecting))
            .exception_handler(
                grpcframe::ErrorKind::App("rejected"),
                Box::new(|err| Ok(ResponseEnvelope::error(403, err.message()))),
            )
            .build()
    };

    let res = dispatcher
        .dispatch(RequestEnvelope::new("/ping", Method::Get), &NoopTransport)
        .unwrap();
    assert_eq!(res.status_code, 403);
    assert!(!res.result);
    assert_eq!(res.message.as_deref(), Some("nope"));
}

/// Fails on the way out.
struct AfterFails;

impl Middleware for AfterFails {
    fn after(&self, _res: ResponseEnvelope) -> Result<ResponseEnvelope, DispatchError> {
        Err(DispatchError::internal("after hook broke"))
    }
}

#[test]
fn test_after_hook_error_maps_to_internal_response() {
    common::setup();
    let dispatcher = unsafe {
        Dispatcher::builder()
            .route("/ping", &[Method::Get], HandlerDescriptor::new(), |_| {
                Ok(json!({}))
            })
            .middleware(Arc::new(AfterFails))
            .build()
    };

    let res = dispatcher
        .dispatch(RequestEnvelope::new("/ping", Method::Get), &NoopTransport)
        .unwrap();
    assert_eq!(res.status_code, 500);
    assert!(!res.result);
}
