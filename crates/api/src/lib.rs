//! # Slotbook API
//!
//! The API crate provides the web server implementation for the slotbook
//! scheduling service. It exposes endpoints for authoring recurring
//! availability windows, materializing them into bookable time slots,
//! querying availability, and reserving or releasing slots.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Map domain errors onto HTTP responses
//! - **Events**: Emit post-commit booking events for downstream listeners
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database
//! interactions. All ordering guarantees for competing reservations come
//! from the datastore transaction layer, so any number of handler tasks
//! may run concurrently.

/// Configuration module for API settings
pub mod config;
/// Post-commit booking event channel
pub mod events;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::{error_handling::HandleErrorLayer, http::StatusCode, Router};
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::{BoxError, ServiceBuilder};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers.
///
/// Identity (customer and provider ids) is supplied per request by the
/// caller; nothing request-scoped lives in here.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Ceiling on a single slot-generation range, in days
    pub max_generation_days: i64,
    /// How long a two-phase hold stays live before lazy expiry
    pub hold_minutes: i64,
    /// Post-commit event sink; sends never block and never fail a request
    pub events: tokio::sync::mpsc::UnboundedSender<events::BookingEvent>,
}

/// Starts the API server with the provided configuration and database
/// connection: initializes logging, wires routes and middleware, spawns
/// the event listener, and serves until shutdown.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Post-commit events are consumed out-of-band; a slow or absent
    // listener must never slow down or roll back a booking.
    let (events_tx, events_rx) = events::channel();
    events::spawn_logger(events_rx);

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        max_generation_days: config.max_generation_days,
        hold_minutes: config.hold_minutes,
        events: events_tx,
    });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Schedule window and slot administration endpoints
        .merge(routes::schedule::routes())
        // Availability read endpoints
        .merge(routes::availability::routes())
        // Booking endpoints
        .merge(routes::booking::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .filter_map(|origin| match origin.parse::<axum::http::HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring unparseable CORS origin: {origin}");
                    None
                }
            })
            .collect::<Vec<_>>();

        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(origins);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_err: BoxError| async move {
                StatusCode::REQUEST_TIMEOUT
            }))
            .timeout(std::time::Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
