use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use uuid::Uuid;

use super::repo_types::Item;
use crate::preferences::dto::FoodPreference;

/// Item-level view of the preference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPreference {
    pub item_id: Uuid,
    pub description: String,
    pub score: f64,
    pub proteins: f64,
    pub lipids: f64,
    pub carbohydrates: f64,
    pub energy: f64,
    pub can_eat_at: BTreeSet<Uuid>,
}

impl ItemPreference {
    pub fn eligible_for(&self, type_of_meal_id: Uuid) -> bool {
        self.can_eat_at.contains(&type_of_meal_id)
    }
}

/// Aggregates per-food scores and nutrients into per-item values.
///
/// Every value is weighted by `amount / serving_grams`. An item is servable
/// at a meal type only if all of its foods are. Items referencing a food
/// missing from `foods` (forbidden or deleted) are left out. Output is sorted
/// by descending score.
pub fn aggregate_items(
    items: &[Item],
    foods: &[FoodPreference],
    serving_grams: f64,
) -> Vec<ItemPreference> {
    let by_id: HashMap<Uuid, &FoodPreference> = foods.iter().map(|f| (f.food_id, f)).collect();

    let mut out: Vec<ItemPreference> = items
        .iter()
        .filter_map(|item| aggregate_one(item, &by_id, serving_grams))
        .collect();
    sort_by_score(&mut out);
    out
}

fn aggregate_one(
    item: &Item,
    by_id: &HashMap<Uuid, &FoodPreference>,
    serving_grams: f64,
) -> Option<ItemPreference> {
    let mut agg = ItemPreference {
        item_id: item.id,
        description: item.description.clone(),
        score: 0.0,
        proteins: 0.0,
        lipids: 0.0,
        carbohydrates: 0.0,
        energy: 0.0,
        can_eat_at: BTreeSet::new(),
    };

    for (idx, line) in item.foods.iter().enumerate() {
        let Some(food) = by_id.get(&line.food_id) else {
            tracing::debug!(item_id = %item.id, food_id = %line.food_id, "item skipped, food unavailable");
            return None;
        };
        let w = line.amount_grams / serving_grams;
        agg.score += food.score as f64 * w;
        agg.proteins += food.proteins * w;
        agg.lipids += food.lipids * w;
        agg.carbohydrates += food.carbohydrates * w;
        agg.energy += food.energy * w;

        let meals: BTreeSet<Uuid> = food.can_eat_at.iter().copied().collect();
        agg.can_eat_at = if idx == 0 {
            meals
        } else {
            agg.can_eat_at.intersection(&meals).copied().collect()
        };
    }
    Some(agg)
}

pub fn sort_by_score(items: &mut [ItemPreference]) {
    items.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.description.cmp(&b.description))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

/// Items servable at `type_of_meal_id`, best first.
pub fn candidates_for(items: &[ItemPreference], type_of_meal_id: Uuid) -> Vec<&ItemPreference> {
    let mut c: Vec<&ItemPreference> = items.iter().filter(|i| i.eligible_for(type_of_meal_id)).collect();
    c.sort_by(|a, b| b.score.total_cmp(&a.score));
    c
}
