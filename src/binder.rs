//! Argument binder: produces the ordered argument list a handler receives
//! from the decoded request body and query string.
//!
//! Each route carries a [`HandlerDescriptor`] declaring its parameters in
//! order. Binding runs once per call, before any middleware before-hook, and
//! a binding failure short-circuits straight to the exception mapper.

use std::sync::Arc;

use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::DispatchError;
use crate::schema::{CoerceError, FieldType, ModelSchema};

/// Maximum parameters before the argument vector spills to the heap.
/// Handlers rarely declare more than a body model, a query model, and a
/// couple of raw fields.
pub const MAX_INLINE_ARGS: usize = 4;

/// Stack-allocated argument storage for the dispatch hot path.
pub type ArgVec = SmallVec<[(Arc<str>, Value); MAX_INLINE_ARGS]>;

/// How a single declared parameter is produced from the request.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    /// Construct the model from the *entire* body mapping.
    BodyModel(ModelSchema),
    /// Parse the query string into key/value pairs and construct the model
    /// from that mapping.
    QueryModel(ModelSchema),
    /// Copy/coerce a single named value out of the body.
    RawField(FieldType),
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub binding: BindingKind,
}

impl ParamSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, binding: BindingKind) -> Self {
        Self {
            name: name.into(),
            binding,
        }
    }
}

/// Ordered parameter declarations for one handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerDescriptor {
    params: Vec<ParamSpec>,
}

impl HandlerDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter bound from the full request body.
    #[must_use]
    pub fn body_model(mut self, name: impl Into<String>, schema: ModelSchema) -> Self {
        self.params
            .push(ParamSpec::new(name, BindingKind::BodyModel(schema)));
        self
    }

    /// Declare a parameter bound from the parsed query string.
    #[must_use]
    pub fn query_model(mut self, name: impl Into<String>, schema: ModelSchema) -> Self {
        self.params
            .push(ParamSpec::new(name, BindingKind::QueryModel(schema)));
        self
    }

    /// Declare a scalar parameter copied from `body[name]`.
    #[must_use]
    pub fn raw_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.params
            .push(ParamSpec::new(name, BindingKind::RawField(ty)));
        self
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Bound arguments for one handler invocation, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    args: ArgVec,
}

impl BoundArgs {
    /// Get an argument by parameter name.
    ///
    /// Last write wins if a descriptor declares the same name twice.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.args.iter().map(|(k, v)| (k.as_ref(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Parse a raw query string into a string-keyed mapping.
///
/// Values are URL-decoded; duplicate names keep the last occurrence.
#[must_use]
pub fn parse_query(query: &str) -> Map<String, Value> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

/// Bind a handler's declared parameters from the request body and query.
///
/// Parameters bind in declaration order; the first failure aborts the whole
/// binding with a `Validation` error.
pub fn bind(
    descriptor: &HandlerDescriptor,
    body: &Map<String, Value>,
    query: &str,
) -> Result<BoundArgs, DispatchError> {
    let mut args = ArgVec::new();
    for spec in descriptor.params() {
        let value = match &spec.binding {
            BindingKind::BodyModel(schema) => Value::Object(schema.construct(body)?),
            BindingKind::QueryModel(schema) => {
                let params = parse_query(query);
                Value::Object(schema.construct(&params)?)
            }
            BindingKind::RawField(ty) => {
                let raw = body.get(&spec.name).ok_or_else(|| {
                    DispatchError::validation(format!(
                        "missing body field '{}'",
                        spec.name
                    ))
                })?;
                ty.coerce(raw).map_err(|CoerceError| {
                    DispatchError::validation(format!(
                        "body field '{}' is not a valid {}",
                        spec.name,
                        ty.as_str()
                    ))
                })?
            }
        };
        args.push((Arc::from(spec.name.as_str()), value));
    }
    debug!(bound = args.len(), "Arguments bound");
    Ok(BoundArgs { args })
}
