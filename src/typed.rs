//! Typed handler layer: declare a concrete argument struct instead of
//! poking at [`BoundArgs`] by name.
//!
//! The argument struct converts from the bound arguments via `TryFrom`; a
//! failed conversion is a validation failure and never reaches the handler.

use std::convert::TryFrom;

use serde_json::Value;

use crate::binder::{BoundArgs, HandlerDescriptor};
use crate::dispatcher::DispatcherBuilder;
use crate::envelope::Method;
use crate::error::DispatchError;

/// Handler with a typed argument struct.
pub trait TypedHandler: Send + 'static {
    /// Converted from [`BoundArgs`]; conversion failure yields a 400.
    type Args: TryFrom<BoundArgs, Error = anyhow::Error> + Send + 'static;

    fn handle(&self, args: Self::Args) -> Result<Value, DispatchError>;
}

impl DispatcherBuilder {
    /// Register a route whose handler takes a typed argument struct.
    #[must_use]
    pub fn route_typed<H>(
        self,
        url: &str,
        methods: &[Method],
        descriptor: HandlerDescriptor,
        handler: H,
    ) -> Self
    where
        H: TypedHandler,
    {
        self.route(url, methods, descriptor, move |args: &BoundArgs| {
            let typed = H::Args::try_from(args.clone())
                .map_err(|err| DispatchError::validation(err.to_string()))?;
            handler.handle(typed)
        })
    }
}
