use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::account::api::AccountState;
use crate::todo::{NewTodo, StatusChange, TodoBatch, TodoItem};
use crate::web::error::{ApiError, ErrorResponse};
use crate::web::extract::{AccountIdPath, TokenHeader, ValidatedJson};

/// JSON representation of a todo for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TodoJson {
    /// Per-account sequence number
    pub number: i32,
    /// Free text of the todo
    pub context: String,
    pub done: bool,
}

impl From<TodoItem> for TodoJson {
    fn from(todo: TodoItem) -> Self {
        Self {
            number: todo.number(),
            context: todo.context().to_string(),
            done: todo.done(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TodoAddRequest {
    #[validate(length(max = 100, message = "context must be at most 100 characters"))]
    pub context: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TodoStatusChangeRequest {
    pub number: i32,
    pub done: bool,
}

/// Batch mutation request. Missing lists are treated as empty.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct TodoBatchRequest {
    #[serde(default)]
    #[validate(nested)]
    pub add: Vec<TodoAddRequest>,
    #[serde(default)]
    #[validate(nested)]
    pub status_change: Vec<TodoStatusChangeRequest>,
    #[serde(default)]
    pub delete: Vec<i32>,
}

impl From<TodoBatchRequest> for TodoBatch {
    fn from(request: TodoBatchRequest) -> Self {
        Self {
            add: request
                .add
                .into_iter()
                .map(|todo| NewTodo {
                    context: todo.context,
                    done: todo.done,
                })
                .collect(),
            status_change: request
                .status_change
                .into_iter()
                .map(|change| StatusChange {
                    number: change.number,
                    done: change.done,
                })
                .collect(),
            delete: request.delete,
        }
    }
}

/// Handler for GET /account/{id} - Returns the todos of the account.
#[tracing::instrument(skip(state, token))]
#[utoipa::path(
    get,
    path = "/account/{id}",
    params(
        ("id" = i64, Path, description = "Account ID"),
        ("jwt-token" = String, Header, description = "Token issued by /login/{id}")
    ),
    responses(
        (status = 200, description = "Todos of the account", body = [TodoJson]),
        (status = 400, description = "Invalid token or unknown account", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<AccountState>>,
    AccountIdPath(id): AccountIdPath,
    token: TokenHeader,
) -> Result<Json<Vec<TodoJson>>, ApiError> {
    state.auth.authorize(token.as_deref(), id).await?;
    state.accounts.ensure_exists(id).await?;

    let todos = state.todo_store.list_todos(id).await?;
    Ok(Json(todos.into_iter().map(TodoJson::from).collect()))
}

/// Handler for POST /account/{id} - Applies a batch of todo mutations.
///
/// Additions run first, then status changes, then deletions. The first failing
/// item aborts the rest of the batch; earlier items are not rolled back.
#[tracing::instrument(skip(state, request))]
#[utoipa::path(
    post,
    path = "/account/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = TodoBatchRequest,
    responses(
        (status = 200, description = "Batch applied", body = String, example = json!("done")),
        (status = 400, description = "Invalid batch or failed item", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn modify_todos_handler(
    State(state): State<Arc<AccountState>>,
    AccountIdPath(id): AccountIdPath,
    ValidatedJson(request): ValidatedJson<TodoBatchRequest>,
) -> Result<Json<&'static str>, ApiError> {
    let batch = TodoBatch::from(request);
    state.todos.apply(id, &batch).await?;
    Ok(Json("done"))
}
