use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse},
    error::{Error, Result},
    utils::token::issue_token,
    AppState,
};

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.username, &payload.password)
        .await?;

    let hours = state.config.jwt_expiration_hours;
    let access_token = issue_token(&user, &state.config.jwt_secret, hours)
        .map_err(|e| Error::Internal(format!("Failed to create JWT: {}", e)))?;

    tracing::info!(username = %user.username, role = user.role(), "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: hours * 3600,
        role: user.role(),
    }))
}
