use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::models::{DayConfig, SelectionKey, SubmissionKind};
use crate::state::{lock, AvailabilityState};

#[derive(Debug, Deserialize)]
pub struct BeginBlockRequest {
    pub unit_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct MarkAllFullDayRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditDayRequest {
    pub target: SelectionKey,
    pub config: DayConfig,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub confirm: bool,
    #[serde(default)]
    pub reviewed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AvailablePeriodsQuery {
    pub unit_id: i64,
    pub date: NaiveDate,
}

// ==============================================================================
// SESSION
// ==============================================================================

/// Opens (or reloads) the session behind a public link.
#[axum::debug_handler]
pub async fn load_period(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.open(&token).await?;
    let controller = lock(&session)?;

    Ok(Json(json!(controller.snapshot())))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let controller = lock(&session)?;

    Ok(Json(json!(controller.snapshot())))
}

#[axum::debug_handler]
pub async fn get_unit_selections(
    State(state): State<Arc<AvailabilityState>>,
    Path((token, unit_id)): Path<(String, i64)>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let controller = lock(&session)?;
    let grouped = controller.unit_selections(unit_id)?;

    Ok(Json(json!(grouped)))
}

#[axum::debug_handler]
pub async fn get_available_periods(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
    Query(query): Query<AvailablePeriodsQuery>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let controller = lock(&session)?;

    Ok(Json(json!({
        "unit_id": query.unit_id,
        "date": query.date,
        "available_periods": controller.available_periods(query.unit_id, query.date),
    })))
}

// ==============================================================================
// PENDING BLOCK
// ==============================================================================

#[axum::debug_handler]
pub async fn begin_block(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
    Json(request): Json<BeginBlockRequest>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    controller.begin_block(request.unit_id, request.date)?;

    Ok(Json(json!(controller.snapshot())))
}

#[axum::debug_handler]
pub async fn set_mark_all_full_day(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
    Json(request): Json<MarkAllFullDayRequest>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    controller.set_mark_all_full_day(request.enabled)?;

    Ok(Json(json!(controller.snapshot())))
}

#[axum::debug_handler]
pub async fn set_pending_day(
    State(state): State<Arc<AvailabilityState>>,
    Path((token, date)): Path<(String, NaiveDate)>,
    Json(config): Json<DayConfig>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    controller.set_pending_day(date, config)?;

    Ok(Json(json!(controller.snapshot())))
}

#[axum::debug_handler]
pub async fn confirm_block(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    let block_id = controller.confirm_block()?;

    Ok(Json(json!({
        "block_id": block_id,
        "session": controller.snapshot(),
    })))
}

#[axum::debug_handler]
pub async fn cancel_block(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    let cancelled = controller.cancel_block();

    Ok(Json(json!({
        "cancelled": cancelled,
        "session": controller.snapshot(),
    })))
}

// ==============================================================================
// COMMITTED SELECTIONS
// ==============================================================================

#[axum::debug_handler]
pub async fn remove_block(
    State(state): State<Arc<AvailabilityState>>,
    Path((token, block_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    let removed = controller.remove_block(&block_id)?;

    Ok(Json(json!({
        "removed": removed,
        "session": controller.snapshot(),
    })))
}

#[axum::debug_handler]
pub async fn edit_day(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
    Json(request): Json<EditDayRequest>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;
    let edited = controller.edit_day(&request.target, request.config)?;

    Ok(Json(json!({
        "edited": edited,
        "session": controller.snapshot(),
    })))
}

// ==============================================================================
// BACKEND ROUND TRIPS
// ==============================================================================

/// Draft-save (`confirm = false`) or confirm-submit. The first confirm
/// without `reviewed` answers with the review list instead of submitting.
#[axum::debug_handler]
pub async fn submit(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<Value>, AppError> {
    let session = state.session(&token).await?;
    let mut controller = lock(&session)?;

    let kind = SubmissionKind::from_confirm(request.confirm);
    let outcome = controller.submit(kind, request.reviewed).await?;
    info!("Submission handled for period {}", controller.period().id);

    Ok(Json(json!({
        "result": outcome,
        "session": controller.snapshot(),
    })))
}

pub async fn download_calendar(
    State(state): State<Arc<AvailabilityState>>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let session = state.session(&token).await?;
    let feed = {
        let controller = lock(&session)?;
        controller.calendar_feed().await?
    };

    Ok((
        [
            (header::CONTENT_TYPE, feed.content_type),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"disponibilidade.ics\"".to_string(),
            ),
        ],
        feed.body,
    )
        .into_response())
}
