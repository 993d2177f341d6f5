//! `POST /ask`

use axum::extract::State;
use tracing::debug;

use super::middleware::truncate_for_log;
use super::state::AppState;
use super::types::{ApiError, AskRequest, AskResponse, Json};

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    debug!(question = %truncate_for_log(&request.question, 200), "Ask received");

    let result = state.cache_service.ask(&request.question).await?;

    Ok(Json(result.into()))
}
