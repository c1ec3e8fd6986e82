//! Request/response envelopes exchanged with the transport layer.
//!
//! The transport decodes every inbound call into a [`RequestEnvelope`] and
//! encodes the [`ResponseEnvelope`] the dispatcher produces back onto the
//! wire. The envelopes are plain data: the opaque transport context travels
//! alongside them as a separate argument to
//! [`Dispatcher::dispatch`](crate::dispatcher::Dispatcher::dispatch).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP-style methods carried inside the generic Dispatch call.
///
/// The wire protocol encodes these as a numeric enum (`GET = 0` .. `DELETE = 3`);
/// [`Method::from_wire`] decodes that representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// All methods the dispatch engine routes on.
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Decode the numeric wire representation of a method.
    pub fn from_wire(code: i32) -> Result<Self, UnsupportedMethod> {
        match code {
            0 => Ok(Method::Get),
            1 => Ok(Method::Post),
            2 => Ok(Method::Put),
            3 => Ok(Method::Delete),
            _ => Err(UnsupportedMethod(code.to_string())),
        }
    }

    /// Numeric wire representation of this method.
    #[must_use]
    pub fn to_wire(self) -> i32 {
        match self {
            Method::Get => 0,
            Method::Post => 1,
            Method::Put => 2,
            Method::Delete => 3,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

impl From<Method> for http::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnsupportedMethod;

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

/// A method outside the supported GET/POST/PUT/DELETE set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl fmt::Display for UnsupportedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported method: {}", self.0)
    }
}

impl std::error::Error for UnsupportedMethod {}

/// Decoded inbound call as delivered by the transport.
///
/// Immutable once constructed; middleware before-hooks receive it by value
/// and return a (possibly transformed) copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Application-level URL carried inside the call body. May include a
    /// query component; route resolution only looks at the path part.
    pub url: String,
    /// HTTP-style method recovered from the wire enum.
    pub method: Method,
    /// Structured body: a string-keyed map of scalar/nested values.
    #[serde(default)]
    pub body: Map<String, Value>,
    /// Raw query string (no leading `?`).
    #[serde(default)]
    pub query: String,
}

impl RequestEnvelope {
    #[must_use]
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            body: Map::new(),
            query: String::new(),
        }
    }

    /// Set the structured body.
    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    /// Set the raw query string.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Path component of [`Self::url`], with any query suffix stripped.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or("/")
    }
}

/// Outbound result of one dispatch, always produced exactly once per call
/// (except the unrecoverable double-fault, which escalates through the
/// transport context instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// HTTP-style status code (200, 400, 404, 500, ...).
    pub status_code: u16,
    /// Whether the call succeeded.
    pub result: bool,
    /// Explanatory message; present on every failure path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured payload; an empty object on error responses.
    pub data: Value,
}

impl ResponseEnvelope {
    /// Successful response: `status_code = 200`, `result = true`.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            status_code: 200,
            result: true,
            message: None,
            data,
        }
    }

    /// Failure response with an empty data object.
    #[must_use]
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            result: false,
            message: Some(message.into()),
            data: Value::Object(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_codes() {
        for m in Method::ALL {
            assert_eq!(Method::from_wire(m.to_wire()).unwrap(), m);
        }
        assert!(Method::from_wire(7).is_err());
    }

    #[test]
    fn test_path_strips_query() {
        let req = RequestEnvelope::new("/users?limit=10", Method::Get);
        assert_eq!(req.path(), "/users");
        let bare = RequestEnvelope::new("/users", Method::Get);
        assert_eq!(bare.path(), "/users");
    }

    #[test]
    fn test_error_envelope_shape() {
        let res = ResponseEnvelope::error(404, "no such route");
        assert_eq!(res.status_code, 404);
        assert!(!res.result);
        assert_eq!(res.data, serde_json::json!({}));
    }
}
