use std::sync::Arc;

use axum::{routing::get, Router};

use availability_cell::{public_response_routes, AvailabilityState};
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let availability = Arc::new(AvailabilityState::new(config));

    Router::new()
        .route("/", get(|| async { "Macro period response API is running!" }))
        .nest("/p", public_response_routes(availability))
}
