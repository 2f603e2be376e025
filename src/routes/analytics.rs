use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::json;
use validator::Validate;

use crate::{dto::analytics_dto::AnswerEvent, error::Result, AppState};

#[axum::debug_handler]
pub async fn log_answer(
    State(state): State<AppState>,
    Json(event): Json<AnswerEvent>,
) -> Result<impl IntoResponse> {
    event.validate()?;
    state.analytics_service.log_answer(&event).await?;
    Ok(Json(json!({"status": "success"})))
}

#[axum::debug_handler]
pub async fn question_analytics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let analytics = state.analytics_service.all_analytics().await?;
    Ok(Json(analytics))
}
