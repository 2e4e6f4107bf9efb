use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::encoder::EncodeError;

/// Failures surfaced to the caller. `Display` is the exact message put in
/// the JSON body; encoder details stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No data provided")]
    InputMissing,

    #[error("Error generating QR code")]
    Encoding(#[source] EncodeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InputMissing => StatusCode::BAD_REQUEST,
            ApiError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EncodeError> for ApiError {
    fn from(err: EncodeError) -> Self {
        ApiError::Encoding(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_message_hides_details() {
        let err = ApiError::from(EncodeError::Task("worker panicked".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error generating QR code");
    }

    #[test]
    fn missing_input_is_a_client_error() {
        assert_eq!(ApiError::InputMissing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InputMissing.to_string(), "No data provided");
    }
}
