//! Lost & Found QR server.
//!
//! Serves the create, scan-landing and my-activity pages plus the JSON API
//! behind them.
//!
//! # Architecture
//!
//! - Axum web framework, Askama templates for server-side rendering
//! - `PostgreSQL` for owners and scans, or an in-memory store for local runs
//! - `LISTEN/NOTIFY` change feed fanned out to Server-Sent Events
//!
//! # Database roles
//!
//! Registration and scan logging use the privileged `LOSTFOUND_DATABASE_URL`.
//! Activity lookups and the change listener use
//! `LOSTFOUND_READER_DATABASE_URL` when set.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use lost_found_server::config::{AppConfig, LogFormat, StoreConfig};
use lost_found_server::db::{self, MemoryStore, PgStore, Store};
use lost_found_server::notify::{ScanFeed, listener};
use lost_found_server::routes;
use lost_found_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lost_found_server=info,tower_http=debug".into());

    let json_layer = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (format == LogFormat::Text).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Build the configured store, starting the change listener for Postgres.
async fn build_store(config: &AppConfig, feed: &ScanFeed) -> Arc<dyn Store> {
    match &config.store {
        StoreConfig::Postgres {
            database_url,
            reader_database_url,
        } => {
            let writer = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            let reader = match reader_database_url {
                Some(url) => Some(
                    db::create_pool(url)
                        .await
                        .expect("Failed to create reader database pool"),
                ),
                None => None,
            };
            tracing::info!(separate_reader = reader.is_some(), "Database pools created");

            // NOTE: Migrations are NOT run automatically on startup.
            // Run them explicitly via: cargo run -p lost-found-cli -- migrate

            let store = PgStore::new(writer, reader);
            // Detached; runs for the life of the process
            drop(listener::spawn(store.reader().clone(), feed.clone()));
            Arc::new(store)
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::with_feed(feed.clone()))
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    init_tracing(config.log_format);

    let feed = ScanFeed::new(config.feed_capacity);
    let store = build_store(&config, &feed).await;
    let addr = config.socket_addr();
    let state = AppState::new(config, store, feed);

    let app = routes::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("lost-found listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
