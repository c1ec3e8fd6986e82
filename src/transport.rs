//! Transport boundary: the one seam where the core reaches through to the
//! transport instead of producing its own envelope.
//!
//! The transport collaborator passes its per-call context token alongside
//! the request envelope. The dispatcher never touches it except on a
//! double-fault, where it sets a transport-level failure instead of
//! returning a structured response.

/// Opaque per-call transport context.
///
/// Implemented by the transport layer over whatever its wire context is
/// (e.g. a server-call handle exposing an error code and details).
pub trait TransportContext: Send + Sync {
    /// Signal an unrecoverable dispatch failure to the transport.
    ///
    /// Called exactly once per double-fault; the transport should surface it
    /// as an internal wire-level error.
    fn fail(&self, details: &str);
}

/// Context for callers without a transport-level failure channel (tests,
/// in-process dispatch). Escalations are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

impl TransportContext for NoopTransport {
    fn fail(&self, _details: &str) {}
}
