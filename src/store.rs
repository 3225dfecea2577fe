use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::foods::{self, Food, FoodCategory};
use crate::items::{self, Item};
use crate::plans::repo_types::{NutritionalPlan, NutritionalPlanHasMeal, PlanMealType};
use crate::preferences::repo_types::{Consumption, Specificity};
use crate::{plans, preferences};

/// Everything the recommendation engine reads from or writes to persistence.
#[async_trait]
pub trait NutritionStore: Send + Sync {
    async fn food_catalog(&self) -> anyhow::Result<Vec<Food>>;
    async fn food_categories(&self) -> anyhow::Result<Vec<FoodCategory>>;
    async fn items(&self) -> anyhow::Result<Vec<Item>>;
    /// LIKE / DONT_LIKE rows only.
    async fn user_preferences(&self, user_id: Uuid) -> anyhow::Result<Vec<Specificity>>;
    async fn forbidden_food_ids(&self, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
    async fn user_consumption(&self, user_id: Uuid, since: Date) -> anyhow::Result<Vec<Consumption>>;
    async fn fatigued_food_ids(
        &self,
        user_id: Uuid,
        period_days: i64,
        threshold: i64,
    ) -> anyhow::Result<Vec<Uuid>>;
    async fn plan_meal_types(&self, plan_id: Uuid) -> anyhow::Result<Vec<PlanMealType>>;
    async fn nutritional_plan(&self, plan_id: Uuid) -> anyhow::Result<Option<NutritionalPlan>>;
    async fn find_meal_slot(
        &self,
        plan_id: Uuid,
        meals_of_plan_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<NutritionalPlanHasMeal>>;
    async fn create_meal_slot(
        &self,
        plan_id: Uuid,
        meals_of_plan_id: Uuid,
        date: Date,
    ) -> anyhow::Result<NutritionalPlanHasMeal>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// The date `days` before today, saturating at [`Date::MIN`].
pub fn days_ago(days: i64) -> Date {
    days.checked_mul(86_400)
        .map(Duration::seconds)
        .and_then(|back| today().checked_sub(back))
        .unwrap_or(Date::MIN)
}

#[async_trait]
impl NutritionStore for PgStore {
    async fn food_catalog(&self) -> anyhow::Result<Vec<Food>> {
        foods::repo::list_foods(&self.db).await
    }

    async fn food_categories(&self) -> anyhow::Result<Vec<FoodCategory>> {
        foods::repo::list_categories(&self.db).await
    }

    async fn items(&self) -> anyhow::Result<Vec<Item>> {
        items::repo::list_items(&self.db).await
    }

    async fn user_preferences(&self, user_id: Uuid) -> anyhow::Result<Vec<Specificity>> {
        preferences::repo::list_user_preferences(&self.db, user_id).await
    }

    async fn forbidden_food_ids(&self, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        preferences::repo::list_forbidden_food_ids(&self.db, user_id, plan_id).await
    }

    async fn user_consumption(&self, user_id: Uuid, since: Date) -> anyhow::Result<Vec<Consumption>> {
        preferences::repo::list_consumption(&self.db, user_id, since).await
    }

    async fn fatigued_food_ids(
        &self,
        user_id: Uuid,
        period_days: i64,
        threshold: i64,
    ) -> anyhow::Result<Vec<Uuid>> {
        let since = days_ago(period_days);
        preferences::repo::list_fatigued_food_ids(&self.db, user_id, since, threshold).await
    }

    async fn plan_meal_types(&self, plan_id: Uuid) -> anyhow::Result<Vec<PlanMealType>> {
        plans::repo::list_plan_meal_types(&self.db, plan_id).await
    }

    async fn nutritional_plan(&self, plan_id: Uuid) -> anyhow::Result<Option<NutritionalPlan>> {
        plans::repo::get_plan(&self.db, plan_id).await
    }

    async fn find_meal_slot(
        &self,
        plan_id: Uuid,
        meals_of_plan_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<NutritionalPlanHasMeal>> {
        plans::repo::find_meal_slot(&self.db, plan_id, meals_of_plan_id, date).await
    }

    async fn create_meal_slot(
        &self,
        plan_id: Uuid,
        meals_of_plan_id: Uuid,
        date: Date,
    ) -> anyhow::Result<NutritionalPlanHasMeal> {
        plans::repo::create_meal_slot(&self.db, plan_id, meals_of_plan_id, date).await
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory store for engine tests. Slot writes are kept so repeated
    /// completions can be observed.
    #[derive(Default)]
    pub struct MemoryStore {
        pub foods: Vec<Food>,
        pub categories: Vec<FoodCategory>,
        pub items: Vec<Item>,
        pub preferences: Vec<Specificity>,
        pub forbidden: Vec<Uuid>,
        pub consumption: Vec<Consumption>,
        pub fatigued: Vec<Uuid>,
        pub meal_types: Vec<PlanMealType>,
        pub plan: Option<NutritionalPlan>,
        pub slots: Mutex<Vec<NutritionalPlanHasMeal>>,
        /// Slot creation on this date fails.
        pub fail_on: Option<Date>,
        /// The next N slot lookups report nothing, as if another writer
        /// inserted the slot between our check and our insert.
        pub missed_finds: AtomicUsize,
        pub catalog_reads: AtomicUsize,
        pub preference_reads: AtomicUsize,
    }

    impl MemoryStore {
        pub fn slot_count(&self) -> usize {
            self.slots.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NutritionStore for MemoryStore {
        async fn food_catalog(&self) -> anyhow::Result<Vec<Food>> {
            self.catalog_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.foods.clone())
        }

        async fn food_categories(&self) -> anyhow::Result<Vec<FoodCategory>> {
            Ok(self.categories.clone())
        }

        async fn items(&self) -> anyhow::Result<Vec<Item>> {
            Ok(self.items.clone())
        }

        async fn user_preferences(&self, user_id: Uuid) -> anyhow::Result<Vec<Specificity>> {
            self.preference_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .preferences
                .iter()
                .filter(|p| p.user_id == user_id && p.kind.polarity().is_some())
                .cloned()
                .collect())
        }

        async fn forbidden_food_ids(&self, _user_id: Uuid, _plan_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
            Ok(self.forbidden.clone())
        }

        async fn user_consumption(&self, _user_id: Uuid, _since: Date) -> anyhow::Result<Vec<Consumption>> {
            Ok(self.consumption.clone())
        }

        async fn fatigued_food_ids(&self, _user_id: Uuid, _period_days: i64, _threshold: i64) -> anyhow::Result<Vec<Uuid>> {
            Ok(self.fatigued.clone())
        }

        async fn plan_meal_types(&self, _plan_id: Uuid) -> anyhow::Result<Vec<PlanMealType>> {
            Ok(self.meal_types.clone())
        }

        async fn nutritional_plan(&self, plan_id: Uuid) -> anyhow::Result<Option<NutritionalPlan>> {
            let slots = self.slots.lock().unwrap().clone();
            Ok(self.plan.clone().filter(|p| p.id == plan_id).map(|mut p| {
                p.scheduled_meals = slots;
                p
            }))
        }

        async fn find_meal_slot(
            &self,
            plan_id: Uuid,
            meals_of_plan_id: Uuid,
            date: Date,
        ) -> anyhow::Result<Option<NutritionalPlanHasMeal>> {
            let missed = self
                .missed_finds
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if missed.is_ok() {
                return Ok(None);
            }
            Ok(self
                .slots
                .lock()
                .unwrap()
                .iter()
                .find(|s| {
                    s.nutritional_plan_id == plan_id
                        && s.meals_of_plan_id == meals_of_plan_id
                        && s.meal_date == date
                })
                .cloned())
        }

        async fn create_meal_slot(
            &self,
            plan_id: Uuid,
            meals_of_plan_id: Uuid,
            date: Date,
        ) -> anyhow::Result<NutritionalPlanHasMeal> {
            if self.fail_on == Some(date) {
                anyhow::bail!("simulated write failure");
            }
            let mut slots = self.slots.lock().unwrap();
            // unique (plan, meal_of_plan, date); a duplicate insert is a no-op
            if let Some(existing) = slots.iter().find(|s| {
                s.nutritional_plan_id == plan_id
                    && s.meals_of_plan_id == meals_of_plan_id
                    && s.meal_date == date
            }) {
                return Ok(existing.clone());
            }
            let slot = NutritionalPlanHasMeal {
                id: Uuid::new_v4(),
                nutritional_plan_id: plan_id,
                meals_of_plan_id,
                meal_date: date,
            };
            slots.push(slot.clone());
            Ok(slot)
        }
    }
}
