use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{FoodPreference, PreferenceQuery};
use super::scoring;
use crate::cache::content_hash;
use crate::error::EngineError;
use crate::foods::Food;
use crate::items::{aggregate_items, ItemPreference};
use crate::state::AppState;
use crate::store::days_ago;

/// Full food catalog, read through the single-entry catalog cache.
pub async fn food_catalog(st: &AppState, force_reload: bool) -> anyhow::Result<Arc<Vec<Food>>> {
    let key = st.config.database_identity();
    if !force_reload {
        if let Some(hit) = st.caches.catalog.get(&key).await {
            debug!(cache_hit = true, foods = hit.len(), "food catalog");
            return Ok(hit);
        }
    }
    let foods = st.store.food_catalog().await?;
    debug!(cache_hit = false, force_reload, foods = foods.len(), "food catalog");
    Ok(st.caches.catalog.put(key, foods).await)
}

/// Category-propagated scores, cached by the hash of everything they depend on.
async fn propagated_scores(
    st: &AppState,
    user_id: Uuid,
    catalog: &[Food],
    force_reload: bool,
) -> anyhow::Result<Arc<HashMap<Uuid, i64>>> {
    let categories = st.store.food_categories().await?;
    let preferences = st.store.user_preferences(user_id).await?;
    let key = content_hash(&(&categories, &preferences, catalog))?;

    if !force_reload {
        if let Some(hit) = st.caches.preferences.get(&key).await {
            debug!(%user_id, cache_hit = true, "preference scores");
            return Ok(hit);
        }
    }

    let scores = scoring::propagate(&categories, catalog, &preferences);
    debug!(%user_id, cache_hit = false, preferences = preferences.len(), "preference scores");
    Ok(st.caches.preferences.put(key, scores).await)
}

/// Detailed per-food ranking for a user, best first.
pub async fn food_preferences(
    st: &AppState,
    q: &PreferenceQuery,
) -> Result<Vec<FoodPreference>, EngineError> {
    let cfg = &st.config.recommendation;
    let catalog = food_catalog(st, q.force_reload).await?;
    let mut scores = (*propagated_scores(st, q.user_id, &catalog, q.force_reload).await?).clone();

    let fatigued: HashSet<Uuid> = st
        .store
        .fatigued_food_ids(q.user_id, cfg.period_to_fatigue_days, cfg.amount_to_fatigue)
        .await?
        .into_iter()
        .collect();
    let since = days_ago(cfg.period_to_analyze_days);
    let consumption = st.store.user_consumption(q.user_id, since).await?;
    scoring::apply_consumption(&mut scores, &fatigued, &consumption, cfg.amount_to_fatigue);

    let forbidden: Option<HashSet<Uuid>> = if q.available {
        let ids = st
            .store
            .forbidden_food_ids(q.user_id, q.nutritional_plan_id)
            .await?;
        Some(ids.into_iter().collect())
    } else {
        None
    };

    let ranked = scoring::rank(&catalog, &scores, forbidden.as_ref());
    info!(
        user_id = %q.user_id,
        foods = ranked.len(),
        fatigued = fatigued.len(),
        consumed = consumption.len(),
        "food preferences ranked"
    );
    Ok(ranked)
}

/// Item-level ranking derived from [`food_preferences`].
pub async fn item_preferences(
    st: &AppState,
    q: &PreferenceQuery,
) -> Result<Vec<ItemPreference>, EngineError> {
    let foods = food_preferences(st, q).await?;
    let items = st.store.items().await?;
    let ranked = aggregate_items(&items, &foods, st.config.recommendation.default_serving_grams);
    debug!(user_id = %q.user_id, items = ranked.len(), "item preferences ranked");
    Ok(ranked)
}
