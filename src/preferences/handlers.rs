use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{FoodPreference, PreferenceQuery};
use super::services;
use crate::state::AppState;

pub fn preference_routes() -> Router<AppState> {
    Router::new().route("/recommendations/preferences", get(get_preferences))
}

/// GET /recommendations/preferences?user_id&nutritional_plan_id&available&force_reload
#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    Query(q): Query<PreferenceQuery>,
) -> Result<Json<Vec<FoodPreference>>, (StatusCode, String)> {
    let prefs = services::food_preferences(&state, &q).await?;
    Ok(Json(prefs))
}
