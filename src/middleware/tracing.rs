use tracing::info;

use super::Middleware;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::DispatchError;

/// Structured request/response logging.
///
/// Stateless by construction: both hooks log and pass the envelope through
/// unchanged, so one instance serves any number of concurrent calls.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: RequestEnvelope) -> Result<RequestEnvelope, DispatchError> {
        info!(
            method = %req.method,
            url = %req.url,
            body_fields = req.body.len(),
            "Request received"
        );
        Ok(req)
    }

    fn after(&self, res: ResponseEnvelope) -> Result<ResponseEnvelope, DispatchError> {
        info!(
            status = res.status_code,
            result = res.result,
            "Response produced"
        );
        Ok(res)
    }
}
