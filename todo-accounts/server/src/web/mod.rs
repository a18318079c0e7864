use axum::Router;
use axum::extract::MatchedPath;
use axum::http::{HeaderName, Method, header};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::account::api::{AccountState, create_account_router};
use crate::account::{AccountIdAllocator, AccountService};
use crate::auth::api::create_login_router;
use crate::auth::{AuthFlow, CredentialVerifier, PasswordHasher, TokenService};
use crate::config::Config;
use crate::store::{AccountStore, DbStore, TodoStore};
use crate::todo::TodoMutationEngine;

pub mod api;
pub mod error;
pub mod extract;

use extract::TOKEN_HEADER;

/// Everything the routers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthFlow>,
    pub accounts: Arc<AccountState>,
}

impl AppState {
    /// Wires services over `db`, seeding the account id allocator from it.
    pub async fn build(config: &Config, db: DatabaseConnection) -> anyhow::Result<Self> {
        let store = Arc::new(DbStore::new(db));
        let account_store: Arc<dyn AccountStore> = store.clone();
        let todo_store: Arc<dyn TodoStore> = store;

        let ids = Arc::new(AccountIdAllocator::load(account_store.as_ref()).await?);
        let hasher = Arc::new(PasswordHasher::from_config(config));
        let auth = Arc::new(AuthFlow::new(
            CredentialVerifier::new(account_store.clone(), hasher.clone()),
            TokenService::from_config(config)?,
        ));

        let accounts = Arc::new(AccountState {
            accounts: AccountService::new(account_store, hasher, ids, auth.clone()),
            auth: auth.clone(),
            todos: TodoMutationEngine::new(todo_store.clone()),
            todo_store,
        });

        Ok(Self { auth, accounts })
    }
}

/// Builds the full application router without binding a socket.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let token_header = HeaderName::from_static(TOKEN_HEADER);

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(create_account_router(state.accounts))
        .merge(create_login_router(state.auth))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([
                    token_header.clone(),
                    header::AUTHORIZATION,
                ]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(TimeoutLayer::new(request_timeout))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::DELETE])
                        .allow_headers([token_header, header::CONTENT_TYPE]),
                ),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let state = AppState::build(&config, db).await?;
    let app = create_app(state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Span maker that flags routes whose bodies carry passwords.
/// Such spans never record headers or bodies.
#[derive(Clone, Debug)]
pub struct FilteredMakeSpan;

impl FilteredMakeSpan {
    fn is_sensitive(method: &Method, path: &str) -> bool {
        path.starts_with("/login/") || (method == Method::DELETE && path.starts_with("/account/"))
    }
}

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if Self::is_sensitive(method, uri.path()) {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}
