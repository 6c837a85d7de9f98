use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use chrono::{DateTime, Utc};
use crate::errors::{AppError, AppResult};
use crate::models::{LoginForm, Role, SignupForm, User};
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_session";

/// A user as returned to clients, without the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

pub async fn handle_signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> AppResult<Response> {
    let user = state.users.signup(form).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(user))).into_response())
}

pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<Json<UserView>> {
    let user = state.users.login(form).await?;

    session
        .insert(SESSION_USER_KEY, user.email.clone())
        .await
        .map_err(|e| AppError::Auth(format!("Session error: {}", e)))?;

    Ok(Json(UserView::from(user)))
}

pub async fn handle_logout(session: Session) -> StatusCode {
    if let Err(e) = session.remove::<String>(SESSION_USER_KEY).await {
        tracing::warn!("Session removal error: {}", e);
    }
    StatusCode::NO_CONTENT
}
