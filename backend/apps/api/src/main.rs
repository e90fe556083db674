//! API Server Entry Point
//!
//! Startup failures are `anyhow` errors; everything a request can hit
//! goes through `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use decision::application::sweeper::spawn_sweeper;
use decision::middleware::{NEW_SESSION_HEADER, SessionThrottleState};
use decision::{
    DecisionConfig, InMemoryEdgeRepository, PgEdgeRepository, ScenarioGate, decision_router,
    with_session_throttle,
};
use platform::config::env_or;
use platform::{ScenarioLockRegistry, SessionThrottle};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer, ExposeHeaders};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "api=info,decision=info,platform=info,tower_http=info";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(load_config()?);

    // One registry and one throttle for the whole process
    let locks = Arc::new(ScenarioLockRegistry::new());
    let throttle = Arc::new(SessionThrottle::new(config.throttle));
    spawn_sweeper(
        throttle.clone(),
        locks.clone(),
        config.sweep_interval,
        config.session_idle,
    );

    let gate = ScenarioGate::new(locks, config.lock_wait_timeout);
    let api = with_session_throttle(
        edge_routes(gate, config.clone()).await?,
        SessionThrottleState {
            throttle,
            cookie: Arc::new(config.session_cookie.clone()),
        },
    );

    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_from_env());

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned())
        .parse()
        .context("BIND_ADDR is not a socket address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> anyhow::Result<DecisionConfig> {
    let mut config = DecisionConfig::from_env()?;
    // Plain-HTTP dev servers would never see a Secure cookie again.
    if cfg!(debug_assertions) && env::var("SESSION_COOKIE_SECURE").is_err() {
        config.session_cookie = DecisionConfig::development().session_cookie;
    }

    tracing::info!(
        window_secs = config.throttle.window_length.as_secs(),
        max_requests = config.throttle.max_requests_per_window,
        lock_wait_timeout = ?config.lock_wait_timeout,
        secure_cookie = config.session_cookie.secure,
        "Configuration loaded"
    );
    Ok(config)
}

/// Edge routes over Postgres when `DATABASE_URL` is set, in memory otherwise.
async fn edge_routes(gate: ScenarioGate, config: Arc<DecisionConfig>) -> anyhow::Result<Router> {
    let Ok(database_url) = env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set; edges are kept in memory only");
        return Ok(decision_router(InMemoryEdgeRepository::new(), gate, config));
    };

    let pool = PgPoolOptions::new()
        .max_connections(env_or("DATABASE_MAX_CONNECTIONS", 5)?)
        .connect(&database_url)
        .await
        .context("connecting to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .context("running migrations")?;
    tracing::info!("Migrations completed");

    Ok(decision_router(PgEdgeRepository::new(pool), gate, config))
}

fn cors_from_env() -> CorsLayer {
    let origins: Vec<HeaderValue> = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_owned())
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]))
        // Lets browser clients read the minted session id.
        .expose_headers(ExposeHeaders::list([NEW_SESSION_HEADER, header::RETRY_AFTER]))
        .allow_credentials(true)
}
