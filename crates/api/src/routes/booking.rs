use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(handlers::booking::reserve))
        .route("/api/bookings/hold", post(handlers::booking::hold))
        .route("/api/bookings/:id", get(handlers::booking::get_booking))
        .route("/api/bookings/:id/confirm", post(handlers::booking::confirm))
        .route("/api/bookings/:id/cancel", post(handlers::booking::cancel))
        .route(
            "/api/customers/:customer_id/bookings",
            get(handlers::booking::list_customer_bookings),
        )
}
