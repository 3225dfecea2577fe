//! Plan completion: validates a plan, derives per-meal nutrient budgets and
//! idempotently materializes dated meal slots up to the plan's end date.

use time::Date;
use tracing::{debug, info, warn};

use super::dto::{CompletionReport, ItemSummary, MealPlanSummary};
use super::repo_types::{NutrientTargets, NutritionalPlan, PeriodLimit, PlanMealType};
use crate::error::EngineError;
use crate::items::services::candidates_for;
use crate::preferences::dto::PreferenceQuery;
use crate::preferences::services::item_preferences;
use crate::state::AppState;

/// Trims each percentage field so that it sums to at most 100 across the
/// plan's meal types, spreading the excess evenly.
pub fn normalize_percentages(meal_types: &mut [PlanMealType]) {
    if meal_types.is_empty() {
        return;
    }
    let n = meal_types.len() as f64;
    let fields: [fn(&mut PlanMealType) -> &mut f64; 4] = [
        |m| &mut m.calories_percentage,
        |m| &mut m.lipids_percentage,
        |m| &mut m.proteins_percentage,
        |m| &mut m.carbohydrates_percentage,
    ];
    for field in fields {
        let sum: f64 = meal_types.iter_mut().map(|m| *field(m)).sum();
        if sum > 100.0 {
            let cut = (sum - 100.0) / n;
            for m in meal_types.iter_mut() {
                *field(m) -= cut;
            }
        }
    }
}

/// Divisor applied to the plan's absolute limits.
///
/// For `ByMeal` this is `1 / meal_type_count`, so dividing by it multiplies
/// the limit. Kept as-is pending product confirmation.
pub fn period_divisor(period: PeriodLimit, meal_type_count: usize) -> f64 {
    match period {
        PeriodLimit::Daily => 1.0,
        PeriodLimit::Weekly => 7.0,
        PeriodLimit::ByMeal => 1.0 / meal_type_count.max(1) as f64,
    }
}

pub fn occurrence_budget(plan: &NutritionalPlan, meal_type_count: usize) -> NutrientTargets {
    let divisor = period_divisor(plan.period_limit, meal_type_count);
    plan.limits.map(|limit| limit / divisor)
}

/// Absolute budget of one meal type given its (normalized) percentages.
pub fn meal_budget(budget: NutrientTargets, percentages: NutrientTargets) -> NutrientTargets {
    NutrientTargets {
        calories: budget.calories * percentages.calories / 100.0,
        lipids: budget.lipids * percentages.lipids / 100.0,
        proteins: budget.proteins * percentages.proteins / 100.0,
        carbohydrates: budget.carbohydrates * percentages.carbohydrates / 100.0,
    }
}

/// Every day from `start` through `end`, inclusive. Empty when `start > end`.
pub fn date_range(start: Date, end: Date) -> Vec<Date> {
    let mut out = Vec::new();
    let mut day = start;
    while day <= end {
        out.push(day);
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    out
}

/// Runs one plan completion for `q.user_id`.
pub async fn complete_plan(
    st: &AppState,
    q: &PreferenceQuery,
) -> Result<CompletionReport, EngineError> {
    let plan_id = q.nutritional_plan_id;
    let plan = st
        .store
        .nutritional_plan(plan_id)
        .await?
        .ok_or(EngineError::NotFound {
            entity: "nutritional plan",
            id: plan_id,
        })?;
    if plan.user_id != q.user_id {
        warn!(%plan_id, user_id = %q.user_id, owner = %plan.user_id, "plan owned by another user");
        return Err(EngineError::Validation(format!(
            "nutritional plan {plan_id} does not belong to user {}",
            q.user_id
        )));
    }

    let mut meal_types = st.store.plan_meal_types(plan_id).await?;
    if meal_types.is_empty() {
        return Err(EngineError::Validation(format!(
            "nutritional plan {plan_id} has no meal types"
        )));
    }

    let items = item_preferences(st, q).await?;

    normalize_percentages(&mut meal_types);
    let budget = occurrence_budget(&plan, meal_types.len());
    debug!(%plan_id, period = ?plan.period_limit, ?budget, "occurrence budget");

    let start = plan
        .first_meal_date()
        .ok_or_else(|| EngineError::Validation(format!("nutritional plan {plan_id} has no scheduled meals")))?;
    let days = date_range(start, plan.valid_until);

    let mut created = 0;
    let mut existing = 0;
    let mut meals = Vec::with_capacity(meal_types.len());
    for mt in &meal_types {
        let candidates = candidates_for(&items, mt.type_of_meal_id);
        for &day in &days {
            if st
                .store
                .find_meal_slot(plan_id, mt.meals_of_plan_id, day)
                .await?
                .is_some()
            {
                existing += 1;
                continue;
            }
            st.store
                .create_meal_slot(plan_id, mt.meals_of_plan_id, day)
                .await
                .map_err(|source| EngineError::SlotFill {
                    meal_of_plan_id: mt.meals_of_plan_id,
                    date: day,
                    source,
                })?;
            created += 1;
        }

        let percentages = mt.percentages();
        meals.push(MealPlanSummary {
            meals_of_plan_id: mt.meals_of_plan_id,
            type_of_meal_id: mt.type_of_meal_id,
            description: mt.description.clone(),
            percentages,
            budget: meal_budget(budget, percentages),
            candidate_item_ids: candidates.iter().map(|i| i.item_id).collect(),
        });
    }

    info!(%plan_id, user_id = %q.user_id, days = days.len(), created, existing, "plan completed");

    Ok(CompletionReport {
        nutritional_plan_id: plan_id,
        user_id: q.user_id,
        period_limit: plan.period_limit,
        start_date: start,
        end_date: plan.valid_until,
        occurrence_budget: budget,
        meals,
        slots_created: created,
        slots_existing: existing,
        items: items.iter().map(ItemSummary::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::{date, time};
    use uuid::Uuid;

    use super::*;
    use crate::preferences::services::tests::{seeded, Seeded};
    use crate::store::NutritionStore;
    use crate::plans::repo_types::NutritionalPlanHasMeal;

    fn meal_type(calories: f64, type_of_meal_id: Uuid) -> PlanMealType {
        PlanMealType {
            meals_of_plan_id: Uuid::new_v4(),
            type_of_meal_id,
            description: "Meal".into(),
            start_time: time!(8:00),
            end_time: time!(9:00),
            calories_percentage: calories,
            lipids_percentage: 30.0,
            proteins_percentage: 30.0,
            carbohydrates_percentage: 30.0,
        }
    }

    fn plan(user_id: Uuid, period: PeriodLimit, valid_until: Date) -> NutritionalPlan {
        NutritionalPlan {
            id: Uuid::new_v4(),
            user_id,
            limits: NutrientTargets {
                calories: 1400.0,
                lipids: 70.0,
                proteins: 140.0,
                carbohydrates: 210.0,
            },
            period_limit: period,
            active: true,
            valid_until,
            scheduled_meals: Vec::new(),
        }
    }

    #[test]
    fn trims_percentages_over_100() {
        let mut mts = vec![meal_type(60.0, Uuid::new_v4()), meal_type(50.0, Uuid::new_v4())];
        normalize_percentages(&mut mts);
        assert_eq!(mts[0].calories_percentage, 55.0);
        assert_eq!(mts[1].calories_percentage, 45.0);
        assert_eq!(mts[0].lipids_percentage, 30.0);
    }

    #[test]
    fn leaves_percentages_under_100() {
        let mut mts = vec![meal_type(40.0, Uuid::new_v4()), meal_type(50.0, Uuid::new_v4())];
        normalize_percentages(&mut mts);
        assert_eq!(mts[0].calories_percentage, 40.0);
        assert_eq!(mts[1].calories_percentage, 50.0);
    }

    #[test]
    fn budgets_follow_period_limit() {
        let end = date!(2025 - 01 - 31);
        let weekly = occurrence_budget(&plan(Uuid::nil(), PeriodLimit::Weekly, end), 3);
        assert_eq!(weekly.calories, 200.0);
        assert_eq!(weekly.proteins, 20.0);

        let daily = occurrence_budget(&plan(Uuid::nil(), PeriodLimit::Daily, end), 3);
        assert_eq!(daily.calories, 1400.0);

        // divisor is 1/n, so the limit ends up multiplied by n
        let by_meal = occurrence_budget(&plan(Uuid::nil(), PeriodLimit::ByMeal, end), 4);
        assert_eq!(by_meal.calories, 5600.0);
    }

    #[test]
    fn meal_budget_applies_percentages() {
        let b = meal_budget(
            NutrientTargets { calories: 200.0, lipids: 10.0, proteins: 20.0, carbohydrates: 30.0 },
            NutrientTargets { calories: 25.0, lipids: 50.0, proteins: 10.0, carbohydrates: 100.0 },
        );
        assert_eq!(b, NutrientTargets { calories: 50.0, lipids: 5.0, proteins: 2.0, carbohydrates: 30.0 });
    }

    #[test]
    fn date_range_is_inclusive() {
        let days = date_range(date!(2024 - 02 - 27), date!(2024 - 03 - 01));
        assert_eq!(
            days,
            vec![date!(2024 - 02 - 27), date!(2024 - 02 - 28), date!(2024 - 02 - 29), date!(2024 - 03 - 01)]
        );
        assert!(date_range(date!(2024 - 03 - 02), date!(2024 - 03 - 01)).is_empty());
    }

    struct PlanFixture {
        seeded: Seeded,
        plan_id: Uuid,
        breakfast: PlanMealType,
        lunch: PlanMealType,
    }

    // Two meal types, one pre-existing breakfast slot on the 1st, plan valid
    // through the 3rd.
    fn plan_fixture() -> PlanFixture {
        let (breakfast_type, lunch_type) = (Uuid::new_v4(), Uuid::new_v4());
        let mut seeded = seeded(&[breakfast_type]);
        let breakfast = meal_type(60.0, breakfast_type);
        let lunch = meal_type(50.0, lunch_type);
        let p = plan(seeded.user_id, PeriodLimit::Weekly, date!(2025 - 01 - 03));
        let plan_id = p.id;

        seeded.store.plan = Some(p);
        seeded.store.meal_types = vec![breakfast.clone(), lunch.clone()];
        seeded.store.slots.lock().unwrap().push(NutritionalPlanHasMeal {
            id: Uuid::new_v4(),
            nutritional_plan_id: plan_id,
            meals_of_plan_id: breakfast.meals_of_plan_id,
            meal_date: date!(2025 - 01 - 01),
        });
        PlanFixture {
            seeded,
            plan_id,
            breakfast,
            lunch,
        }
    }

    fn query(user_id: Uuid, plan_id: Uuid) -> PreferenceQuery {
        PreferenceQuery {
            user_id,
            nutritional_plan_id: plan_id,
            available: true,
            force_reload: false,
        }
    }

    #[tokio::test]
    async fn fills_missing_slots_once() {
        let fx = plan_fixture();
        let user_id = fx.seeded.user_id;
        let store = Arc::new(fx.seeded.store);
        let st = AppState::fake_with(store.clone());

        let first = complete_plan(&st, &query(user_id, fx.plan_id)).await.unwrap();
        assert_eq!(first.start_date, date!(2025 - 01 - 01));
        assert_eq!(first.slots_existing, 1);
        assert_eq!(first.slots_created, 5);
        assert_eq!(store.slot_count(), 6);

        let second = complete_plan(&st, &query(user_id, fx.plan_id)).await.unwrap();
        assert_eq!(second.slots_created, 0);
        assert_eq!(second.slots_existing, 6);
        assert_eq!(store.slot_count(), 6);
    }

    #[tokio::test]
    async fn reports_budgets_and_candidates() {
        let fx = plan_fixture();
        let user_id = fx.seeded.user_id;
        let st = AppState::fake_with(Arc::new(fx.seeded.store));

        let report = complete_plan(&st, &query(user_id, fx.plan_id)).await.unwrap();
        assert_eq!(report.occurrence_budget.calories, 200.0);

        let breakfast = report
            .meals
            .iter()
            .find(|m| m.meals_of_plan_id == fx.breakfast.meals_of_plan_id)
            .unwrap();
        assert_eq!(breakfast.percentages.calories, 55.0);
        assert_eq!(breakfast.budget.calories, 110.0);
        assert_eq!(breakfast.candidate_item_ids.len(), report.items.len());

        let lunch = report
            .meals
            .iter()
            .find(|m| m.meals_of_plan_id == fx.lunch.meals_of_plan_id)
            .unwrap();
        assert!(lunch.candidate_item_ids.is_empty());
    }

    #[tokio::test]
    async fn concurrent_insert_of_same_slot_is_a_no_op() {
        let fx = plan_fixture();
        let user_id = fx.seeded.user_id;
        // the pre-existing breakfast slot is missed by the first lookup,
        // so completion tries to insert it again
        fx.seeded.store.missed_finds.store(1, std::sync::atomic::Ordering::SeqCst);
        let store = Arc::new(fx.seeded.store);
        let st = AppState::fake_with(store.clone());

        let report = complete_plan(&st, &query(user_id, fx.plan_id)).await.unwrap();
        assert_eq!(report.slots_created + report.slots_existing, 6);
        assert_eq!(store.slot_count(), 6);

        let slot = store
            .create_meal_slot(fx.plan_id, fx.breakfast.meals_of_plan_id, date!(2025 - 01 - 01))
            .await
            .unwrap();
        assert_eq!(slot.meal_date, date!(2025 - 01 - 01));
        assert_eq!(store.slot_count(), 6);
    }

    #[tokio::test]
    async fn rejects_plan_without_meal_types() {
        let mut fx = plan_fixture();
        fx.seeded.store.meal_types.clear();
        let user_id = fx.seeded.user_id;
        let store = Arc::new(fx.seeded.store);
        let st = AppState::fake_with(store.clone());

        let err = complete_plan(&st, &query(user_id, fx.plan_id)).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(store.slot_count(), 1);
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let fx = plan_fixture();
        let user_id = fx.seeded.user_id;
        let st = AppState::fake_with(Arc::new(fx.seeded.store));

        let err = complete_plan(&st, &query(user_id, Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn failed_slot_keeps_earlier_writes() {
        let mut fx = plan_fixture();
        fx.seeded.store.fail_on = Some(date!(2025 - 01 - 03));
        let user_id = fx.seeded.user_id;
        let store = Arc::new(fx.seeded.store);
        let st = AppState::fake_with(store.clone());

        let err = complete_plan(&st, &query(user_id, fx.plan_id)).await.unwrap_err();
        match err {
            EngineError::SlotFill { date, meal_of_plan_id, .. } => {
                assert_eq!(date, date!(2025 - 01 - 03));
                assert_eq!(meal_of_plan_id, fx.breakfast.meals_of_plan_id);
            }
            other => panic!("unexpected error: {other}"),
        }
        // pre-existing slot plus breakfast on the 2nd
        assert_eq!(store.slot_count(), 2);
    }
}
