use crate::account::api::PasswordRequest;
use crate::auth::AuthFlow;
use crate::web::error::{ApiError, ErrorResponse, method_not_allowed};
use crate::web::extract::{AccountIdPath, ValidatedJson};
use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON response for successful login
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Token to send back in the `jwt-token` header
    pub token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse").finish_non_exhaustive()
    }
}

/// Creates a router with the login endpoint.
pub fn create_login_router(state: Arc<AuthFlow>) -> Router {
    Router::new()
        .route(
            "/login/{id}",
            post(login_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Handler for POST /login/{id} - Exchanges the account password for a token.
#[tracing::instrument(skip(auth, request))]
#[utoipa::path(
    post,
    path = "/login/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = PasswordRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Authentication failed", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login_handler(
    State(auth): State<Arc<AuthFlow>>,
    AccountIdPath(id): AccountIdPath,
    ValidatedJson(request): ValidatedJson<PasswordRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = auth.login(id, &request.password).await?;
    tracing::info!("Issued token for account {}", id);
    Ok(Json(LoginResponse { token }))
}
