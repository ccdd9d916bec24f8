//! The client-facing error envelope: a typed error hierarchy mapped to HTTP
//! status, serialized as `{error, data, status}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] airline::Error),

    #[error(transparent)]
    Storage(#[from] airline::error::StorageError),

    #[error("missing or malformed Authorization header")]
    MissingAuth,

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use airline::Error as CoreError;

        let (status, message) = match &self {
            ApiError::Core(CoreError::FlightNotFound(_))
            | ApiError::Core(CoreError::TicketNotFound)
            | ApiError::Core(CoreError::PeerNotFound(_))
            | ApiError::Core(CoreError::SessionNotFound)
            | ApiError::Core(CoreError::ClientNotFound) => (StatusCode::NOT_FOUND, self.to_string()),

            ApiError::Core(CoreError::NoSeatsAvailable) => {
                (StatusCode::NOT_ACCEPTABLE, self.to_string())
            }

            ApiError::Core(CoreError::InvalidCredentials) | ApiError::MissingAuth => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            ApiError::Core(CoreError::AlreadyLoggedIn)
            | ApiError::Core(CoreError::MalformedBody(_))
            | ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),

            ApiError::PeerUnreachable(_) => (StatusCode::BAD_GATEWAY, self.to_string()),

            ApiError::Core(CoreError::Storage(_))
            | ApiError::Core(CoreError::Snapshot(_))
            | ApiError::Storage(_) => {
                tracing::error!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "data": serde_json::Value::Null,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
