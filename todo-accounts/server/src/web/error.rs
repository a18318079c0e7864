use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::account::AccountServiceError;
use crate::auth::AuthError;
use crate::store::StoreError;
use crate::todo::MutationError;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Errors surfaced by JSON handlers.
///
/// Every variant except `MethodNotAllowed` is answered with 400. Authentication
/// failures share one message so callers cannot tell an unknown account from a
/// wrong password or a bad token.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("authentication failed")]
    Unauthorized(#[source] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("{0}")]
    Internal(String),
    #[error("not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(err) => ApiError::Store(err),
            AuthError::Task(err) => ApiError::Internal(err.to_string()),
            AuthError::TokenIssue(err) => ApiError::Internal(err.to_string()),
            other => ApiError::Unauthorized(other),
        }
    }
}

impl From<AccountServiceError> for ApiError {
    fn from(err: AccountServiceError) -> Self {
        match err {
            AccountServiceError::Auth(err) => err.into(),
            AccountServiceError::Store(err) => err.into(),
            AccountServiceError::Hash(err) => ApiError::Internal(err.to_string()),
            AccountServiceError::Task(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(_) | ApiError::Store(StoreError::Database(_)) => {
                tracing::error!("Request failed: {}", self)
            }
            ApiError::Unauthorized(reason) => tracing::info!("Request rejected: {}", reason),
            _ => tracing::debug!("Request rejected: {}", self),
        }
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Method fallback for known paths.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenError;

    async fn body_of(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn auth_failures_share_one_message() {
        let errors = [
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::from(AuthError::MissingToken),
            ApiError::from(AuthError::InvalidToken(TokenError::Expired)),
            ApiError::from(AuthError::InvalidToken(TokenError::SubjectMismatch)),
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_of(response).await,
                serde_json::json!({ "error": "authentication failed" })
            );
        }
    }

    #[tokio::test]
    async fn store_errors_keep_their_message() {
        let response = ApiError::from(StoreError::AccountNotFound(5)).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({ "error": "account 5 not found" })
        );
    }

    #[tokio::test]
    async fn method_not_allowed_uses_405() {
        let response = method_not_allowed().await.into_response();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({ "error": "not allowed" })
        );
    }
}
