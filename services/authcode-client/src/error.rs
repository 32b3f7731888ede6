//! Per-request failures
//!
//! A malformed endpoint or a failed token exchange fails only the request
//! that hit it. The cause is logged and the client gets a 500 with a JSON
//! body: {"error":{"type":"client_error","message":"...","request_id":"req_..."}}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// A handler failure that renders as a 500.
#[derive(Debug)]
pub struct HandlerError {
    source: authcode::Error,
    request_id: String,
}

impl HandlerError {
    pub fn new(source: authcode::Error) -> Self {
        Self {
            source,
            request_id: format!("req_{}", uuid::Uuid::new_v4().as_simple()),
        }
    }
}

impl From<authcode::Error> for HandlerError {
    fn from(source: authcode::Error) -> Self {
        Self::new(source)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        error!(request_id = %self.request_id, error = %self.source, "request failed");

        let body = serde_json::json!({
            "error": {
                "type": "client_error",
                "message": self.source.to_string(),
                "request_id": self.request_id,
            }
        });
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
