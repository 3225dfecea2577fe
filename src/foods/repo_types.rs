use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Food record, nutrient values per reference serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub description: String,
    pub proteins: f64,
    pub lipids: f64,
    pub carbohydrates: f64,
    pub energy: f64,
    pub potassium: f64,
    pub phosphorus: f64,
    pub sodium: f64,
    pub food_category_id: Option<Uuid>,
    pub can_eat_at: Vec<Uuid>, // type_of_meal ids
}

/// Node of the self-referential category tree; `parent_id = None` marks a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FoodCategory {
    pub id: Uuid,
    pub description: String,
    pub level: i32,
    pub parent_id: Option<Uuid>,
}
