mod auth;
mod devices;
mod slots;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use crate::middleware;
use crate::state::AppState;

pub use auth::{handle_login, handle_logout, handle_signup, UserView, SESSION_USER_KEY};
pub use devices::{get_devices, receive_data, sensor_health};
pub use slots::{free_slot, get_slot, list_slots, park_slot, refresh, reserve_slot};

pub fn router(state: AppState, max_body_size: usize) -> Router {
    // Session store setup
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_name("session");

    Router::new()
        // Auth routes
        .route("/signup", post(handle_signup))
        .route("/login", post(handle_login))
        .route("/logout", get(handle_logout))

        // Slot routes
        .route("/slots", get(list_slots))
        .route("/slots/refresh", post(refresh))
        .route("/slots/:slot_id", get(get_slot))
        .route("/slots/:slot_id/reserve", post(reserve_slot))
        .route("/slots/:slot_id/park", post(park_slot))
        .route("/slots/:slot_id/free", post(free_slot))

        // Sensor hub routes
        .route("/data", post(receive_data))
        .route("/devices", get(get_devices))
        .route("/sensors", get(sensor_health))

        .layer(from_fn(middleware::require_auth))
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .with_state(state)
}
