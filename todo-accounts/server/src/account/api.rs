use crate::account::{Account, AccountService};
use crate::auth::AuthFlow;
use crate::store::TodoStore;
use crate::todo::TodoMutationEngine;
use crate::todo::api::{list_todos_handler, modify_todos_handler};
use crate::web::error::{ApiError, ErrorResponse, method_not_allowed};
use crate::web::extract::{AccountIdPath, TokenHeader, ValidatedJson};
use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// Shared state of the account and todo routes.
#[derive(Clone)]
pub struct AccountState {
    pub accounts: AccountService,
    pub auth: Arc<AuthFlow>,
    pub todos: TodoMutationEngine,
    pub todo_store: Arc<dyn TodoStore>,
}

/// JSON representation of an Account for API responses. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountJson {
    /// Unique identifier for the account
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<Account> for AccountJson {
    fn from(account: Account) -> Self {
        Self {
            id: account.id(),
            first_name: account.first_name().to_string(),
            last_name: account.last_name().to_string(),
        }
    }
}

/// Registration payload.
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 50, message = "first_name must be 1 to 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "last_name must be 1 to 50 characters"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl std::fmt::Debug for CreateAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAccountRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Body of requests that must prove knowledge of the password.
#[derive(Deserialize, Validate, ToSchema)]
pub struct PasswordRequest {
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl std::fmt::Debug for PasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordRequest").finish_non_exhaustive()
    }
}

/// Handler for GET /account - Returns all accounts.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/account",
    responses(
        (status = 200, description = "Successfully retrieved accounts", body = [AccountJson]),
        (status = 400, description = "Store failure", body = ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn list_accounts_handler(
    State(state): State<Arc<AccountState>>,
) -> Result<Json<Vec<AccountJson>>, ApiError> {
    let accounts = state.accounts.list().await?;
    Ok(Json(accounts.into_iter().map(AccountJson::from).collect()))
}

/// Handler for POST /account - Registers a new account.
#[tracing::instrument(skip(state, request))]
#[utoipa::path(
    post,
    path = "/account",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created", body = AccountJson),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn create_account_handler(
    State(state): State<Arc<AccountState>>,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> Result<Json<AccountJson>, ApiError> {
    let account = state
        .accounts
        .register(request.first_name, request.last_name, request.password)
        .await?;
    Ok(Json(AccountJson::from(account)))
}

/// Handler for DELETE /account/{id} - Deletes the account and its todos.
///
/// Needs both a token issued for the account and the account's password.
#[tracing::instrument(skip(state, token, request))]
#[utoipa::path(
    delete,
    path = "/account/{id}",
    params(
        ("id" = i64, Path, description = "Account ID"),
        ("jwt-token" = String, Header, description = "Token issued by /login/{id}")
    ),
    request_body = PasswordRequest,
    responses(
        (status = 200, description = "Account deleted", body = String),
        (status = 400, description = "Authentication failed or unknown account", body = ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AccountState>>,
    AccountIdPath(id): AccountIdPath,
    token: TokenHeader,
    ValidatedJson(request): ValidatedJson<PasswordRequest>,
) -> Result<Json<&'static str>, ApiError> {
    state
        .accounts
        .delete(token.as_deref(), id, &request.password)
        .await?;
    Ok(Json("done"))
}

/// Creates and returns the account router.
pub fn create_account_router(state: Arc<AccountState>) -> Router {
    Router::new()
        .route(
            "/account",
            get(list_accounts_handler)
                .post(create_account_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/account/{id}",
            get(list_todos_handler)
                .post(modify_todos_handler)
                .delete(delete_account_handler)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}
