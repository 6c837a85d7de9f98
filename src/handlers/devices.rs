use axum::{
    extract::State,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use crate::models::{DeviceMap, DevicePayload};
use crate::services::SensorReport;
use crate::state::AppState;

pub async fn receive_data(
    State(state): State<AppState>,
    Json(payload): Json<DevicePayload>,
) -> Json<Value> {
    state.devices.record(payload).await;
    Json(json!({ "status": "ok" }))
}

pub async fn get_devices(State(state): State<AppState>) -> Json<DeviceMap> {
    Json(state.devices.devices().await)
}

pub async fn sensor_health(State(state): State<AppState>) -> Json<Vec<SensorReport>> {
    Json(state.sensors.report(Utc::now()).await)
}
