//! Tests for exception mapping defaults, fallback behavior, and
//! double-fault containment.

use std::sync::atomic::{AtomicUsize, Ordering};

use grpcframe::exception::ExceptionMapper;
use grpcframe::{
    DispatchError, Dispatcher, ErrorKind, HandlerDescriptor, Method, RequestEnvelope,
    ResponseEnvelope, TransportContext,
};
use parking_lot::Mutex;
use serde_json::json;

mod common;

#[test]
fn test_default_bindings() {
    let mapper = ExceptionMapper::new();

    let res = mapper.map(&DispatchError::not_found("no route")).unwrap();
    assert_eq!(res.status_code, 404);
    assert_eq!(res.message.as_deref(), Some("no route"));

    let res = mapper.map(&DispatchError::validation("bad age")).unwrap();
    assert_eq!(res.status_code, 400);

    let res = mapper.map(&DispatchError::internal("oops")).unwrap();
    assert_eq!(res.status_code, 500);
    assert!(!res.result);
    assert_eq!(res.message.as_deref(), Some("Internal Server Error"));
    assert_eq!(res.data, json!({}));
}

#[test]
fn test_registered_handler_overrides_default() {
    let mut mapper = ExceptionMapper::new();
    mapper.register(
        ErrorKind::NotFound,
        Box::new(|err| Ok(ResponseEnvelope::error(410, err.message()))),
    );

    let res = mapper.map(&DispatchError::not_found("gone")).unwrap();
    assert_eq!(res.status_code, 410);
}

#[test]
fn test_unregistered_kind_falls_back_to_internal() {
    let mapper = ExceptionMapper::new();
    let res = mapper.map(&DispatchError::app("custom", "detail")).unwrap();
    assert_eq!(res.status_code, 500);
    assert_eq!(res.message.as_deref(), Some("Internal Server Error"));
}

#[test]
fn test_failing_handler_falls_back_to_internal() {
    let mut mapper = ExceptionMapper::new();
    mapper.register(
        ErrorKind::App("flaky"),
        Box::new(|_| Err(DispatchError::internal("handler exploded"))),
    );

    let res = mapper.map(&DispatchError::app("flaky", "x")).unwrap();
    assert_eq!(res.status_code, 500);
}

#[test]
fn test_double_fault_from_mapper() {
    let mut mapper = ExceptionMapper::new();
    mapper.register(
        ErrorKind::App("flaky"),
        Box::new(|_| Err(DispatchError::internal("handler exploded"))),
    );
    mapper.register(
        ErrorKind::Internal,
        Box::new(|_| Err(DispatchError::internal("fallback exploded"))),
    );

    let fault = mapper.map(&DispatchError::app("flaky", "x")).unwrap_err();
    assert!(fault.details.contains("internal error handler failed"));
}

/// Transport stub recording escalation signals.
#[derive(Default)]
struct RecordingTransport {
    calls: AtomicUsize,
    last_details: Mutex<Option<String>>,
}

impl TransportContext for RecordingTransport {
    fn fail(&self, details: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_details.lock() = Some(details.to_string());
    }
}

#[test]
fn test_double_fault_signals_transport_exactly_once() {
    common::setup();
    let dispatcher = unsafe {
        Dispatcher::builder()
            .route("/boom", &[Method::Get], HandlerDescriptor::new(), |_| {
                Err(DispatchError::app("boom", "kaput"))
            })
            .exception_handler(
                ErrorKind::App("boom"),
                Box::new(|_| Err(DispatchError::internal("specific handler failed"))),
            )
            .exception_handler(
                ErrorKind::Internal,
                Box::new(|_| Err(DispatchError::internal("internal handler failed"))),
            )
            .build()
    };

    let transport = RecordingTransport::default();
    let res = dispatcher.dispatch(RequestEnvelope::new("/boom", Method::Get), &transport);

    assert!(res.is_none());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert!(transport.last_details.lock().as_deref().unwrap().contains("internal error handler failed"));

    // the dispatcher stays serviceable after a double fault
    let res = dispatcher.dispatch(RequestEnvelope::new("/missing", Method::Get), &transport);
    assert_eq!(res.unwrap().status_code, 404);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}
