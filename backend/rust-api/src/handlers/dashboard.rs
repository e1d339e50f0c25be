use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{error::QuizError, extractors::UserId, models::DashboardResponse, services::AppState};

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<Json<DashboardResponse>, QuizError> {
    Ok(Json(state.dashboard.dashboard(&user_id).await?))
}
