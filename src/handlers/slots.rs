use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use crate::errors::{AppError, AppResult};
use crate::models::{ReservationForm, Slot};
use crate::services::SlotAck;
use crate::state::AppState;

pub async fn list_slots(State(state): State<AppState>) -> Json<Vec<Slot>> {
    Json(state.slots.get_slots().await)
}

pub async fn get_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> AppResult<Json<Slot>> {
    state
        .slots
        .slot(&slot_id)
        .await
        .map(Json)
        .ok_or(AppError::SlotNotFound(slot_id))
}

// Persist the new snapshot and let mounted pollers pick the change up.
async fn publish_change(state: &AppState) {
    state.slots.persist(&state.snapshot).await;
    state.registry.refresh_now();
}

pub async fn reserve_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
    Json(form): Json<ReservationForm>,
) -> AppResult<Json<Slot>> {
    tracing::info!("Reservation request for slot {}", slot_id);
    let slot = state.slots.reserve_slot_for(&slot_id, form).await?;
    publish_change(&state).await;
    Ok(Json(slot))
}

pub async fn park_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> Json<SlotAck> {
    let ack = state.slots.reserve_slot(&slot_id).await;
    if ack.applied {
        publish_change(&state).await;
    }
    Json(ack)
}

pub async fn free_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> Json<SlotAck> {
    let ack = state.slots.free_slot(&slot_id).await;
    if ack.applied {
        publish_change(&state).await;
    }
    Json(ack)
}

pub async fn refresh(State(state): State<AppState>) -> Json<Value> {
    let refreshed = state.registry.refresh_now();
    Json(json!({ "refreshed": refreshed }))
}
