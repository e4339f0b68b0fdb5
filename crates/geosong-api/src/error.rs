//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Error returned by every handler, rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    BadGateway(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<geosong_core::Error> for ApiError {
    fn from(err: geosong_core::Error) -> Self {
        use geosong_core::Error;
        match err {
            // The caller-facing message is the bare reason.
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::NoUsableMedia => ApiError::BadRequest(err.to_string()),
            Error::ExternalService(_) => ApiError::BadGateway(err.to_string()),
            Error::PollExhausted { .. } => ApiError::GatewayTimeout(err.to_string()),
            Error::Cancelled(_) => ApiError::ServiceUnavailable(err.to_string()),
            Error::DescriptionFailed(_)
            | Error::LyricsGeneration(_)
            | Error::Serialization(_)
            | Error::Config(_)
            | Error::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg) => msg,
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
