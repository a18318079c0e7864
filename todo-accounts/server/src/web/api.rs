use utoipa::OpenApi;

use crate::account::api::{AccountJson, CreateAccountRequest, PasswordRequest};
use crate::auth::api::LoginResponse;
use crate::todo::api::{TodoAddRequest, TodoBatchRequest, TodoJson, TodoStatusChangeRequest};
use crate::web::error::ErrorResponse;

/// OpenAPI document of the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::account::api::list_accounts_handler,
        crate::account::api::create_account_handler,
        crate::account::api::delete_account_handler,
        crate::todo::api::list_todos_handler,
        crate::todo::api::modify_todos_handler,
        crate::auth::api::login_handler,
    ),
    components(schemas(
        AccountJson,
        CreateAccountRequest,
        PasswordRequest,
        LoginResponse,
        TodoJson,
        TodoAddRequest,
        TodoStatusChangeRequest,
        TodoBatchRequest,
        ErrorResponse,
    )),
    tags(
        (name = "Accounts", description = "Account registration and deletion"),
        (name = "Todos", description = "Per-account todo lists"),
        (name = "Auth", description = "Password login")
    )
)]
pub struct ApiDoc;
