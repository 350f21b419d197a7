use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/windows", post(handlers::schedule::create_window))
        .route("/api/windows/:id", get(handlers::schedule::get_window))
        .route(
            "/api/windows/:id",
            delete(handlers::schedule::deactivate_window),
        )
        .route(
            "/api/providers/:provider_id/windows",
            get(handlers::schedule::list_windows),
        )
        .route(
            "/api/slots/generate",
            post(handlers::schedule::generate_slots),
        )
        .route(
            "/api/slots/cleanup",
            post(handlers::schedule::cleanup_slots),
        )
        .route("/api/slots/:id/block", post(handlers::schedule::block_slot))
        .route(
            "/api/slots/:id/unblock",
            post(handlers::schedule::unblock_slot),
        )
        .route("/api/slots/:id/staff", put(handlers::schedule::assign_staff))
}
