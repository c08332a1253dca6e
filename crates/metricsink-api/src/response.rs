use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use metricsink_core::Error;

/// Standard API response structure
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub message: String,
    pub code: String,
    pub errors: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            message: message.into(),
            code: "SUCCESS".to_string(),
            errors: vec![],
        }
    }

    /// Create a successful response without data
    pub fn success_no_data(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            message: message.into(),
            code: "SUCCESS".to_string(),
            errors: vec![],
        }
    }

    /// Create a not found error response
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self {
            data: None,
            message: format!("{} not found", resource),
            code: "NOT_FOUND".to_string(),
            errors: vec![],
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            code: "BAD_REQUEST".to_string(),
            errors: vec![],
        }
    }

    /// Create an internal error response
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            code: "INTERNAL_ERROR".to_string(),
            errors: vec![],
        }
    }

    /// Translate a pipeline error. Credential validation is the client's
    /// fault; an unsupported source type on a stored connection is a
    /// configuration bug and stays a server error.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::InvalidCredentials { .. } => Self::bad_request(error.to_string()),
            Error::ConnectionNotFound(_) => Self::not_found("Connection"),
            _ => Self::internal_error(error.to_string()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "SUCCESS" => StatusCode::OK,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metricsink_core::SourceType;
    use uuid::Uuid;

    #[test]
    fn error_translation_matches_status_codes() {
        let bad = ApiResponse::<()>::from_error(&Error::InvalidCredentials {
            source_type: SourceType::Figma,
            reason: "missing apiKey".to_string(),
        });
        assert_eq!(bad.code, "BAD_REQUEST");

        let missing = ApiResponse::<()>::from_error(&Error::ConnectionNotFound(Uuid::new_v4()));
        assert_eq!(missing.code, "NOT_FOUND");

        let unsupported =
            ApiResponse::<()>::from_error(&Error::UnsupportedSourceType("sketch".to_string()));
        assert_eq!(unsupported.code, "INTERNAL_ERROR");
    }
}
