//! Declarative model schemas for body/query binding and response validation.
//!
//! A [`ModelSchema`] is the Rust-side stand-in for the structural models the
//! transport's callers declare: a named, ordered set of scalar fields.
//! Construction is strict — the source mapping's key set must equal the
//! declared field set exactly (missing *and* extra keys are errors), and each
//! value must coerce to its declared scalar type.

use serde_json::{Map, Number, Value};

use crate::error::DispatchError;

/// Scalar types a model field or raw parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }

    /// Coerce a JSON value to this scalar type.
    ///
    /// Values already of the right JSON type pass through; strings are parsed
    /// (query parameters always arrive as strings). Scalars stringify for
    /// [`FieldType::String`]. Anything else is a coercion failure.
    pub fn coerce(&self, value: &Value) -> Result<Value, CoerceError> {
        match self {
            FieldType::String => match value {
                Value::String(s) => Ok(Value::String(s.clone())),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(CoerceError),
            },
            FieldType::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| CoerceError),
                _ => Err(CoerceError),
            },
            FieldType::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or(CoerceError),
                _ => Err(CoerceError),
            },
            FieldType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => s.trim().parse::<bool>().map(Value::from).map_err(|_| CoerceError),
                _ => Err(CoerceError),
            },
        }
    }
}

/// Marker error for a single failed scalar coercion; callers wrap it with
/// field/parameter context before it leaves the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoerceError;

/// A named structural model: an ordered list of `(field, type)` declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    name: &'static str,
    fields: Vec<(String, FieldType)>,
}

impl ModelSchema {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Declare a field. Declaration order is preserved in constructed models.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    /// Construct a model instance from an untyped mapping.
    ///
    /// The source key set must exactly equal the declared field set; each
    /// value must coerce to its declared type. Failures are
    /// [`ErrorKind::Validation`](crate::error::ErrorKind::Validation) errors
    /// naming the model and the offending field.
    pub fn construct(&self, source: &Map<String, Value>) -> Result<Map<String, Value>, DispatchError> {
        for (field, _) in &self.fields {
            if !source.contains_key(field) {
                return Err(DispatchError::validation(format!(
                    "model '{}': missing field '{}'",
                    self.name, field
                )));
            }
        }
        if source.len() != self.fields.len() {
            let extra: Vec<&str> = source
                .keys()
                .filter(|k| !self.fields.iter().any(|(f, _)| f == *k))
                .map(String::as_str)
                .collect();
            return Err(DispatchError::validation(format!(
                "model '{}': unexpected field(s) {:?}",
                self.name, extra
            )));
        }

        let mut out = Map::with_capacity(self.fields.len());
        for (field, ty) in &self.fields {
            let raw = &source[field];
            let coerced = ty.coerce(raw).map_err(|CoerceError| {
                DispatchError::validation(format!(
                    "model '{}': field '{}' is not a valid {}",
                    self.name,
                    field,
                    ty.as_str()
                ))
            })?;
            out.insert(field.clone(), coerced);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signup_schema() -> ModelSchema {
        ModelSchema::new("Signup")
            .field("username", FieldType::String)
            .field("age", FieldType::Integer)
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_construct_exact_match() {
        let out = signup_schema()
            .construct(&obj(json!({"username": "a", "age": 3})))
            .unwrap();
        assert_eq!(Value::Object(out), json!({"username": "a", "age": 3}));
    }

    #[test]
    fn test_construct_rejects_missing_and_extra() {
        let schema = signup_schema();
        assert!(schema.construct(&obj(json!({"username": "a"}))).is_err());
        assert!(schema
            .construct(&obj(json!({"username": "a", "age": 3, "extra": 1})))
            .is_err());
    }

    #[test]
    fn test_coerce_from_strings() {
        // query parameters always arrive as strings
        let out = signup_schema()
            .construct(&obj(json!({"username": "a", "age": "17"})))
            .unwrap();
        assert_eq!(out["age"], json!(17));
        assert_eq!(
            FieldType::Boolean.coerce(&json!("true")).unwrap(),
            json!(true)
        );
        assert!(FieldType::Integer.coerce(&json!("abc")).is_err());
        assert!(FieldType::Integer.coerce(&json!([1])).is_err());
    }
}
