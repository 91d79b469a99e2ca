//! Catalog Server
//!
//! Library catalog REST server.

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{sessions::SessionService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("catalog_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Catalog Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let sessions = SessionService::new(&config.redis.url, config.session.clone())
        .await
        .context("Failed to connect to Redis")?;

    tracing::info!("Connected to Redis");

    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), sessions)
        .await
        .context("Failed to create services")?;

    services
        .users
        .ensure_bootstrap_admin()
        .await
        .context("Failed to create bootstrap admin")?;

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    let addr = SocketAddr::new(
        server_host.parse::<IpAddr>().context("Invalid host address")?,
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Catalog
        .route("/", get(api::home::index))
        .route("/listings", get(api::listings::list_listings))
        .route("/listings/:id", get(api::listings::get_listing))
        // Realtors
        .route("/realtors", get(api::realtors::list_realtors))
        .route("/realtors", post(api::realtors::create_realtor))
        .route("/realtors/:id", get(api::realtors::get_realtor))
        .route("/realtors/:id", put(api::realtors::update_realtor))
        .route("/realtors/:id", delete(api::realtors::delete_realtor))
        // Loans
        .route("/mylistings", get(api::loans::my_listings))
        .route("/listinginstances/available", get(api::loans::all_available))
        .route(
            "/listinginstances/:id/loan",
            get(api::loans::loan_form).post(api::loans::process_loan),
        )
        .route("/listinginstances/:id/return", post(api::loans::return_instance))
        // Admin console
        .route("/admin", get(api::admin::registry))
        .route("/admin/listings", get(api::admin::list_listings).post(api::admin::create_listing))
        .route(
            "/admin/listings/:id",
            get(api::admin::get_listing)
                .put(api::admin::update_listing)
                .delete(api::admin::delete_listing),
        )
        .route("/admin/realtors", get(api::admin::list_realtors).post(api::admin::create_realtor))
        .route(
            "/admin/realtors/:id",
            get(api::admin::get_realtor)
                .put(api::admin::update_realtor)
                .delete(api::admin::delete_realtor),
        )
        .route("/admin/genres", get(api::admin::list_genres).post(api::admin::create_genre))
        .route(
            "/admin/genres/:id",
            get(api::admin::get_genre)
                .put(api::admin::update_genre)
                .delete(api::admin::delete_genre),
        )
        .route(
            "/admin/listinginstances",
            get(api::admin::list_instances).post(api::admin::create_instance),
        )
        .route(
            "/admin/listinginstances/:id",
            get(api::admin::get_instance)
                .put(api::admin::update_instance)
                .delete(api::admin::delete_instance),
        )
        .route("/admin/users", get(api::admin::list_users).post(api::admin::create_user))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .merge(catalog)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
