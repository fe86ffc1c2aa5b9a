use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    ReceiptStore, ServerError, TokenSigner, accounts, auth, categories, expenses,
    receipts::MAX_RECEIPT_BYTES, users,
};
use engine::Engine;

/// Room for the form fields next to a receipt of maximum size.
const MAX_BODY_BYTES: usize = MAX_RECEIPT_BYTES + 1024 * 1024;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub signer: Arc<TokenSigner>,
    pub receipts: Arc<dyn ReceiptStore>,
}

impl ServerState {
    pub fn new(engine: Engine, signer: TokenSigner, receipts: Arc<dyn ReceiptStore>) -> Self {
        Self {
            engine: Arc::new(engine),
            signer: Arc::new(signer),
            receipts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

async fn not_found() -> ServerError {
    ServerError::NotFound("The resource you requested could not be found.".to_string())
}

fn api_router(state: ServerState) -> Router<ServerState> {
    let public = Router::new()
        .route("/auth/register", post(users::register))
        .route("/auth/login", post(users::login))
        .route(
            "/categories/global",
            get(categories::list_global).post(categories::create_global),
        )
        .route(
            "/accounts/global",
            get(accounts::list_global).post(accounts::create_global),
        );

    let protected = Router::new()
        .route("/user/profile", get(users::profile))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth));

    public.merge(protected)
}

pub fn router(state: ServerState, config: &ServerConfig) -> Router {
    let mut app = Router::new().nest("/api", api_router(state.clone()));
    if let Some(dir) = state.receipts.serve_dir() {
        app = app.nest_service("/receipts", ServeDir::new(dir));
    }

    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        let method = req.method();
        let uri = req.uri();
        let matched_path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|matched_path| matched_path.as_str());
        tracing::debug_span!("request", %method, %uri, matched_path)
    });

    app.fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(trace)
        .with_state(state)
}

pub async fn run(
    state: ServerState,
    config: ServerConfig,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(state, config, listener).await
}

pub async fn run_with_listener(
    state: ServerState,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub fn spawn_with_listener(
    state: ServerState,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
