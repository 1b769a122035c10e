//! Response envelope
//!
//! Every response body is `{success, data}` or `{success, error}`, and every
//! response carries permissive CORS headers whatever its outcome.

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

use super::context::{Reply, ReplyBody};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// CORS headers attached to every response
pub const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        ACCESS_CONTROL_ALLOW_METHODS,
        "GET, POST, PUT, PATCH, DELETE, OPTIONS",
    ),
    (
        ACCESS_CONTROL_ALLOW_HEADERS,
        "Content-Type, Authorization, X-Correlation-Id",
    ),
    (ACCESS_CONTROL_MAX_AGE, "86400"),
];

const SERIALIZATION_FALLBACK: &str = r#"{"success":false,"error":"Failed to serialize response"}"#;

/// Uniform JSON wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Envelope(Envelope),
    Raw(Value),
}

/// Status code plus body, ready to be written out
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl ApiResponse {
    /// Response to an `OPTIONS` preflight
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: ResponseBody::Empty,
        }
    }

    pub fn from_reply(reply: Reply) -> Self {
        let body = match reply.body {
            ReplyBody::Data(data) => ResponseBody::Envelope(Envelope::data(data)),
            ReplyBody::Raw(document) => ResponseBody::Raw(document),
        };
        Self {
            status: reply.status,
            body,
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %err, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %err, "Request rejected");
        }

        Self {
            status,
            body: ResponseBody::Envelope(Envelope::error(err.to_string())),
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.body {
            ResponseBody::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Headers written with this response
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in CORS_HEADERS {
            headers.insert(name, HeaderValue::from_static(value));
        }
        if self.body != ResponseBody::Empty {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        headers
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let headers = self.headers();
        let body = match &self.body {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Envelope(envelope) => serialize(envelope),
            ResponseBody::Raw(document) => serialize(document),
        };

        (self.status, headers, body).into_response()
    }
}

fn serialize<T: Serialize>(value: &T) -> Body {
    match serde_json::to_vec(value) {
        Ok(bytes) => Body::from(bytes),
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize response body");
            Body::from(SERIALIZATION_FALLBACK)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_error() {
        let json = serde_json::to_value(Envelope::data(json!({"id": 1}))).unwrap();
        assert_eq!(json, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let json = serde_json::to_value(Envelope::error("bad")).unwrap();
        assert_eq!(json, json!({"success": false, "error": "bad"}));
    }

    #[test]
    fn test_error_response_status() {
        let response = ApiResponse::from_error(&AppError::not_found("gone"));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.envelope(), Some(&Envelope::error("gone")));
    }

    #[test]
    fn test_preflight_has_cors_and_no_content_type() {
        let response = ApiResponse::preflight();
        let headers = response.headers();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_error_response_carries_cors() {
        let headers = ApiResponse::from_error(&AppError::InvalidBody).headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }
}
