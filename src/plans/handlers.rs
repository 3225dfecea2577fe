use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::dto::CompletionReport;
use super::services::complete_plan;
use crate::preferences::dto::PreferenceQuery;
use crate::state::AppState;

pub fn completion_routes() -> Router<AppState> {
    Router::new().route("/recommendations/complete", post(complete))
}

/// POST /recommendations/complete?user_id&nutritional_plan_id&available&force_reload
#[instrument(skip(state))]
pub async fn complete(
    State(state): State<AppState>,
    Query(q): Query<PreferenceQuery>,
) -> Result<Json<CompletionReport>, (StatusCode, String)> {
    let report = complete_plan(&state, &q).await?;
    Ok(Json(report))
}
