use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foods::Food;

/// Query shared by the preference and plan completion endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceQuery {
    pub user_id: Uuid,
    pub nutritional_plan_id: Uuid,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub force_reload: bool,
}

/// Ranked food with its final score and nutrient values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodPreference {
    pub food_id: Uuid,
    pub description: String,
    pub food_category_id: Option<Uuid>,
    pub score: i64,
    pub proteins: f64,
    pub lipids: f64,
    pub carbohydrates: f64,
    pub energy: f64,
    pub potassium: f64,
    pub phosphorus: f64,
    pub sodium: f64,
    pub can_eat_at: Vec<Uuid>,
}

impl FoodPreference {
    pub fn from_food(f: &Food, score: i64) -> Self {
        Self {
            food_id: f.id,
            description: f.description.clone(),
            food_category_id: f.food_category_id,
            score,
            proteins: f.proteins,
            lipids: f.lipids,
            carbohydrates: f.carbohydrates,
            energy: f.energy,
            potassium: f.potassium,
            phosphorus: f.phosphorus,
            sodium: f.sodium,
            can_eat_at: f.can_eat_at.clone(),
        }
    }
}
