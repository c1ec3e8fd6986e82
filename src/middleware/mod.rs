mod core;
mod tracing;

pub use self::core::{Middleware, MiddlewarePipeline};
pub use self::tracing::TracingMiddleware;
