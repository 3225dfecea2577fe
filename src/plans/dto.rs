use serde::Serialize;
use time::Date;
use uuid::Uuid;

use super::repo_types::{NutrientTargets, PeriodLimit};
use crate::items::ItemPreference;

/// Simplified item preference entry.
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub item_id: Uuid,
    pub description: String,
    pub score: f64,
}

impl From<&ItemPreference> for ItemSummary {
    fn from(i: &ItemPreference) -> Self {
        Self {
            item_id: i.item_id,
            description: i.description.clone(),
            score: i.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MealPlanSummary {
    pub meals_of_plan_id: Uuid,
    pub type_of_meal_id: Uuid,
    pub description: String,
    pub percentages: NutrientTargets, // after normalization
    pub budget: NutrientTargets,
    pub candidate_item_ids: Vec<Uuid>, // best first
}

#[derive(Debug, Serialize)]
pub struct CompletionReport {
    pub nutritional_plan_id: Uuid,
    pub user_id: Uuid,
    pub period_limit: PeriodLimit,
    pub start_date: Date,
    pub end_date: Date,
    pub occurrence_budget: NutrientTargets,
    pub meals: Vec<MealPlanSummary>,
    pub slots_created: usize,
    pub slots_existing: usize,
    pub items: Vec<ItemSummary>,
}
