//! API error type

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use feedback_forms::{FormsError, RepositoryError};

use crate::models::ErrorBody;

/// Handler failure, rendered as a status code and `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn form_not_found() -> Self {
        FormsError::FormNotFound.into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}

impl From<FormsError> for ApiError {
    fn from(err: FormsError) -> Self {
        match err {
            FormsError::FormNotFound
            | FormsError::ResponseNotFound
            | FormsError::UserNotFound => Self::NotFound(err.to_string()),
            FormsError::NotAcceptingResponses | FormsError::OwnerSubmission => {
                Self::Forbidden(err.to_string())
            }
            FormsError::Validation(message) => Self::BadRequest(message),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Self::NotFound("Not found".into()),
            RepositoryError::Conflict(what) => Self::Conflict(format!("Conflict: {what}")),
            RepositoryError::Storage(detail) => Self::Internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status() {
        assert_eq!(ApiError::from(FormsError::FormNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(FormsError::NotAcceptingResponses).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(FormsError::Validation("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RepositoryError::Storage("disk".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_detail_not_exposed() {
        let err = ApiError::Internal("connection reset".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic() {
        let response = ApiError::from(RepositoryError::Storage("disk full".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(!text.contains("disk full"));
    }
}
