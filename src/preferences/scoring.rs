//! Preference scoring: explicit likes/dislikes propagated through the
//! category tree, then adjusted by what the user actually ate.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::dto::FoodPreference;
use super::repo_types::{Consumption, Specificity};
use crate::foods::{CategoryTree, Food, FoodCategory};

pub const EXACT_FOOD: i64 = 50;
pub const SAME_CATEGORY: i64 = 25;
pub const SAME_PARENT: i64 = 12;
pub const SAME_ROOT: i64 = 7;

pub const FATIGUE_PENALTY: i64 = -100;
pub const NEAR_FATIGUE_BONUS: i64 = 10;
pub const CONFIRMED_BONUS: i64 = 30;
pub const EXPLORATORY_BONUS: i64 = 20;

/// Spreads every LIKE/DONT_LIKE signal over the foods sharing the preferred
/// food's root category, decreasing with relatedness. Every catalog food gets
/// an entry, starting from 0.
pub fn propagate(
    categories: &[FoodCategory],
    foods: &[Food],
    preferences: &[Specificity],
) -> HashMap<Uuid, i64> {
    let tree = CategoryTree::new(categories, foods);
    let by_id: HashMap<Uuid, &Food> = foods.iter().map(|f| (f.id, f)).collect();
    let mut scores: HashMap<Uuid, i64> = foods.iter().map(|f| (f.id, 0)).collect();

    for pref in preferences {
        let Some(sign) = pref.kind.polarity() else {
            continue;
        };
        let Some(preferred) = by_id.get(&pref.food_id) else {
            tracing::warn!(food_id = %pref.food_id, specificity_id = %pref.id, "preference on unknown food skipped");
            continue;
        };

        let Some(category_id) = preferred.food_category_id else {
            *scores.entry(preferred.id).or_default() += sign * EXACT_FOOD;
            continue;
        };
        let parent_id = tree.parent_of(category_id);
        let root_id = tree.root_of(category_id);

        for f in tree.foods_under(root_id) {
            let magnitude = if f.id == preferred.id {
                EXACT_FOOD
            } else if f.food_category_id == Some(category_id) {
                SAME_CATEGORY
            } else if f.food_category_id.and_then(|c| tree.parent_of(c)) == parent_id {
                SAME_PARENT
            } else {
                SAME_ROOT
            };
            *scores.entry(f.id).or_default() += sign * magnitude;
        }
    }
    scores
}

/// Bonus for a non-fatigued food eaten `count` times in the analysis window.
///
/// Near the fatigue threshold the food is only mildly encouraged, clear
/// repeated consumption confirms the preference, and rare consumption gets an
/// exploratory push.
pub fn consumption_bonus(count: i64, amount_to_fatigue: i64) -> i64 {
    let count = count as f64;
    let threshold = amount_to_fatigue as f64;
    if count >= 0.9 * threshold {
        NEAR_FATIGUE_BONUS
    } else if count >= 0.15 * threshold {
        CONFIRMED_BONUS
    } else {
        EXPLORATORY_BONUS
    }
}

pub fn apply_consumption(
    scores: &mut HashMap<Uuid, i64>,
    fatigued: &HashSet<Uuid>,
    consumption: &[Consumption],
    amount_to_fatigue: i64,
) {
    for id in fatigued {
        *scores.entry(*id).or_default() += FATIGUE_PENALTY;
    }
    for c in consumption {
        if fatigued.contains(&c.food_id) {
            continue;
        }
        *scores.entry(c.food_id).or_default() += consumption_bonus(c.count, amount_to_fatigue);
    }
}

/// One record per catalog food, best first. Foods in `forbidden` are dropped.
pub fn rank(
    foods: &[Food],
    scores: &HashMap<Uuid, i64>,
    forbidden: Option<&HashSet<Uuid>>,
) -> Vec<FoodPreference> {
    let mut out: Vec<FoodPreference> = foods
        .iter()
        .filter(|f| forbidden.map_or(true, |set| !set.contains(&f.id)))
        .map(|f| FoodPreference::from_food(f, scores.get(&f.id).copied().unwrap_or(0)))
        .collect();
    out.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.description.cmp(&b.description))
            .then_with(|| a.food_id.cmp(&b.food_id))
    });
    out
}
