//! Clinic API Server - Backend for booking, approvals and compliance
//!
//! Provides REST endpoints for:
//! - Compliance keyword management and content scanning
//! - Slot capacity limits and availability
//! - Booking intake with capacity enforcement
//! - Appointment and reschedule approval queues
//! - LINE platform webhook acknowledgement

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod notify;
mod state;
mod store;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Initialize application state
    info!("Initializing Clinic API...");
    let state = AppState::new().await?;
    let state = Arc::new(state);

    // CORS configuration for the dashboard and LIFF clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Compliance rules and scanning
        .route(
            "/api/compliance/keywords",
            get(handlers::compliance::list_keywords).post(handlers::compliance::create_keyword),
        )
        .route(
            "/api/compliance/keywords/:id",
            axum::routing::patch(handlers::compliance::update_keyword)
                .delete(handlers::compliance::delete_keyword),
        )
        .route("/api/compliance/check", post(handlers::compliance::check_content))
        // Slot capacity
        .route(
            "/api/slots",
            get(handlers::slots::get_by_date)
                .put(handlers::slots::set_limit)
                .delete(handlers::slots::delete_limit),
        )
        .route("/api/slots/range", get(handlers::slots::get_by_range))
        // Bookings
        .route("/api/bookings/available", get(handlers::bookings::available))
        .route("/api/bookings/can-book", get(handlers::bookings::can_book))
        .route("/api/bookings", post(handlers::bookings::submit))
        .route("/api/bookings/:id/cancel", post(handlers::bookings::cancel))
        // Appointment approval queue
        .route("/api/approvals/pending", get(handlers::approvals::list_pending))
        .route("/api/approvals/:id/approve", post(handlers::approvals::approve))
        .route("/api/approvals/:id/reject", post(handlers::approvals::reject))
        // Reschedule queue
        .route(
            "/api/reschedules",
            post(handlers::reschedules::create),
        )
        .route(
            "/api/reschedules/pending",
            get(handlers::reschedules::list_pending),
        )
        .route(
            "/api/reschedules/:id/approve",
            post(handlers::reschedules::approve),
        )
        .route(
            "/api/reschedules/:id/reject",
            post(handlers::reschedules::reject),
        )
        // LINE platform webhook
        .route("/webhook/line", post(handlers::webhook::line_webhook))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Parse bind address
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting Clinic API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
