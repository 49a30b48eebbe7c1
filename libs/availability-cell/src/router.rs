use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AvailabilityState;

/// Routes behind a doctor's public response link. The token is the only
/// credential, so none of these sit behind auth middleware.
pub fn public_response_routes(state: Arc<AvailabilityState>) -> Router {
    Router::new()
        .route("/{token}", get(handlers::load_period))
        .route("/{token}/session", get(handlers::get_session))
        .route("/{token}/units/{unit_id}/selections", get(handlers::get_unit_selections))
        .route("/{token}/available-periods", get(handlers::get_available_periods))

        // Block being configured
        .route("/{token}/pending-block", post(handlers::begin_block).delete(handlers::cancel_block))
        .route("/{token}/pending-block/full-day", put(handlers::set_mark_all_full_day))
        .route("/{token}/pending-block/days/{date}", put(handlers::set_pending_day))
        .route("/{token}/pending-block/confirm", post(handlers::confirm_block))

        // Committed selections
        .route("/{token}/blocks/{block_id}", delete(handlers::remove_block))
        .route("/{token}/selections", put(handlers::edit_day))

        .route("/{token}/submit", post(handlers::submit))
        .route("/{token}/calendar", get(handlers::download_calendar))
        .with_state(state)
}
