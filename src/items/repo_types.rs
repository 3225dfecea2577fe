use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Flat row of the item ⨝ item_foods join.
#[derive(Debug, FromRow)]
pub struct ItemFoodRow {
    pub item_id: Uuid,
    pub description: String,
    pub food_id: Option<Uuid>,
    pub amount_grams: Option<f64>,
}

/// One constituent of a composite item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFood {
    pub food_id: Uuid,
    pub amount_grams: f64,
}

/// Composite/recipe made of foods in fixed gram amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub description: String,
    pub foods: Vec<ItemFood>,
}

/// Folds join rows (ordered by item) into items, preserving line order.
pub fn group_rows(rows: Vec<ItemFoodRow>) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();
    for r in rows {
        if items.last().map(|i| i.id) != Some(r.item_id) {
            items.push(Item {
                id: r.item_id,
                description: r.description,
                foods: Vec::new(),
            });
        }
        if let (Some(food_id), Some(amount_grams), Some(item)) =
            (r.food_id, r.amount_grams, items.last_mut())
        {
            item.foods.push(ItemFood {
                food_id,
                amount_grams,
            });
        }
    }
    items
}
