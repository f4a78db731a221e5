use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipforge_backend::auth::google::GoogleTokenVerifier;
use clipforge_backend::auth::session::SessionCodec;
use clipforge_backend::config::Config;
use clipforge_backend::db::users::MongoUserStore;
use clipforge_backend::{db, logging, routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ClipForge API");

    // Connect to MongoDB; this also enforces the unique email index
    let (client, db) = db::connect(&config.mongo).await?;
    let users = Arc::new(MongoUserStore::new(db));

    // Google ID-token verifier (OIDC discovery + JWKS fetch)
    let google_verifier =
        GoogleTokenVerifier::new(&config.google.issuer, &config.google.client_id).await?;

    let session_codec = SessionCodec::new(
        &config.session.secret,
        Duration::days(config.session.expire_days),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        google_verifier,
        session_codec,
        users,
    });

    // Build CORS layer; cookies need a credentialed, exact-origin setup
    let cors = if config.cors.origins == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    // Build router
    let app = Router::new()
        .merge(routes::health::router(state.clone()))
        .merge(routes::auth::router(state.clone()))
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(cors);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release driver resources before exiting
    client.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
