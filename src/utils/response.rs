//! Response helpers shared by the admin surface and the page front controller.

use http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;

/// Standard content types
pub mod content_type {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const APPLICATION_JSON: &str = "application/json";
    pub const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";
}

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Build a response with `status`, an optional content type and body
    pub fn with_status(
        status: StatusCode,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Response<Vec<u8>> {
        let mut builder = Response::builder().status(status);

        if let Some(ct) = content_type {
            match HeaderValue::from_str(ct) {
                Ok(header_value) => {
                    builder = builder.header(header::CONTENT_TYPE, header_value);
                }
                Err(e) => {
                    log::error!("Invalid content type '{}': {}", ct, e);
                }
            }
        }

        builder.body(body).unwrap_or_else(|e| {
            log::error!("Failed to build response: {}", e);
            Self::error_http(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        })
    }

    /// Build a 200 response
    pub fn success_http(body: Vec<u8>, content_type: Option<&str>) -> Response<Vec<u8>> {
        Self::with_status(StatusCode::OK, body, content_type)
    }

    /// Build a plain-text error response
    pub fn error_http(status: StatusCode, message: &str) -> Response<Vec<u8>> {
        let mut resp = Response::new(message.as_bytes().to_vec());
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type::TEXT_PLAIN),
        );
        resp
    }

    /// Build a JSON 200 response
    pub fn success_json<T: Serialize>(data: &T) -> Response<Vec<u8>> {
        match serde_json::to_vec(data) {
            Ok(json_body) => Self::success_http(json_body, Some(content_type::APPLICATION_JSON)),
            Err(e) => {
                log::error!("Failed to serialize JSON response: {}", e);
                Self::error_http(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "JSON serialization failed",
                )
            }
        }
    }
}

/// Common error response helpers
pub struct CommonErrors;

impl CommonErrors {
    pub fn bad_request(message: &str) -> Response<Vec<u8>> {
        ResponseBuilder::error_http(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: &str) -> Response<Vec<u8>> {
        ResponseBuilder::error_http(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: &str) -> Response<Vec<u8>> {
        ResponseBuilder::error_http(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed() -> Response<Vec<u8>> {
        ResponseBuilder::error_http(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    pub fn internal_server_error(message: &str) -> Response<Vec<u8>> {
        ResponseBuilder::error_http(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}
