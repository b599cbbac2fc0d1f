use axum::{extract::State, Json};
use rockfall_access::session::AuthSnapshot;
use rockfall_core::error::AppError;
use serde::Deserialize;
use validator::Validate;

use crate::AppState;

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthSnapshot>, AppError> {
    payload.validate()?;

    let snapshot = state.session.login(&payload.email, &payload.password).await?;

    if let Some(principal) = &snapshot.principal {
        tracing::info!(
            user_id = %principal.id,
            role = %principal.role,
            provider = state.session.provider_name(),
            "User logged in successfully"
        );
    }

    Ok(Json(snapshot))
}

/// Always succeeds: the local session is cleared even when the remote
/// sign-out fails, which is reported through the snapshot's `warning`.
pub async fn logout_handler(State(state): State<AppState>) -> Json<AuthSnapshot> {
    Json(state.session.logout().await)
}

pub async fn session_handler(State(state): State<AppState>) -> Json<AuthSnapshot> {
    Json(state.session.snapshot())
}

pub async fn refresh_profile_handler(
    State(state): State<AppState>,
) -> Result<Json<AuthSnapshot>, AppError> {
    Ok(Json(state.session.refresh_profile().await?))
}
