use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Service-level failure taxonomy, mapped to HTTP at the boundary. Every
/// error body is a `{"message": "..."}` object.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Role Mismatch: You are registered as {0}")]
    RoleMismatch(String),
    #[error("Email not found in database")]
    UserNotFound,
    #[error("Invalid or expired OTP")]
    InvalidOtp,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("Failed to send email. Check backend console for OTP.")]
    Delivery(anyhow::Error),
    #[error("Database error")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Store(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::RoleMismatch(_) => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidOtp | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Delivery(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Store(cause) => error!(error = %cause, "store failure"),
            ApiError::Delivery(cause) => error!(error = %cause, "mail delivery failure"),
            _ => {}
        }
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn error_body_is_a_message_object() {
        let response = ApiError::RoleMismatch("ADMIN".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Role Mismatch: You are registered as ADMIN");
    }

    #[test]
    fn statuses_follow_the_api_contract() {
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidOtp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Grievance").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Delivery(anyhow::anyhow!("relay down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
