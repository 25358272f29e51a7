use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qlens_common::error::QlensError;

pub struct ApiError(pub QlensError);

impl From<QlensError> for ApiError {
    fn from(err: QlensError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            QlensError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            QlensError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            QlensError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
