use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{NutritionalPlan, NutritionalPlanHasMeal, NutritionalPlanRow, PlanMealType};

/// Plan with its scheduled meals, `None` if missing or soft-deleted.
pub async fn get_plan(db: &PgPool, plan_id: Uuid) -> anyhow::Result<Option<NutritionalPlan>> {
    let row = sqlx::query_as::<_, NutritionalPlanRow>(
        r#"
        SELECT id, user_id, calories_limit, lipids_limit, proteins_limit,
               carbohydrates_limit, period_limit, active, valid_until
          FROM nutritional_plans
         WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(plan_id)
    .fetch_optional(db)
    .await
    .context("get nutritional plan")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let scheduled = sqlx::query_as::<_, NutritionalPlanHasMeal>(
        r#"
        SELECT id, nutritional_plan_id, meals_of_plan_id, meal_date
          FROM nutritional_plan_has_meals
         WHERE nutritional_plan_id = $1
         ORDER BY meal_date, meals_of_plan_id
        "#,
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("list scheduled meals")?;

    NutritionalPlan::from_row(row, scheduled).map(Some)
}

/// Meal-of-plan templates reachable through the plan's scheduled meals.
pub async fn list_plan_meal_types(db: &PgPool, plan_id: Uuid) -> anyhow::Result<Vec<PlanMealType>> {
    let rows = sqlx::query_as::<_, PlanMealType>(
        r#"
        SELECT DISTINCT mop.id AS meals_of_plan_id,
               tom.id AS type_of_meal_id,
               mop.description,
               mop.start_time,
               mop.end_time,
               tom.calories_percentage,
               tom.lipids_percentage,
               tom.proteins_percentage,
               tom.carbohydrates_percentage
          FROM nutritional_plan_has_meals nphm
          JOIN meals_of_plan mop ON mop.id = nphm.meals_of_plan_id
          JOIN type_of_meals tom ON tom.id = mop.type_of_meal_id
         WHERE nphm.nutritional_plan_id = $1
           AND mop.deleted_at IS NULL
         ORDER BY mop.start_time, mop.id
        "#,
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("list plan meal types")?;
    Ok(rows)
}

pub async fn find_meal_slot(
    db: &PgPool,
    plan_id: Uuid,
    meals_of_plan_id: Uuid,
    date: Date,
) -> anyhow::Result<Option<NutritionalPlanHasMeal>> {
    let row = sqlx::query_as::<_, NutritionalPlanHasMeal>(
        r#"
        SELECT id, nutritional_plan_id, meals_of_plan_id, meal_date
          FROM nutritional_plan_has_meals
         WHERE nutritional_plan_id = $1
           AND meals_of_plan_id = $2
           AND meal_date = $3
        "#,
    )
    .bind(plan_id)
    .bind(meals_of_plan_id)
    .bind(date)
    .fetch_optional(db)
    .await
    .context("find meal slot")?;
    Ok(row)
}

/// Creates the slot in its own committed transaction. A concurrent insert of
/// the same (plan, meal, date) is not an error: the existing row is returned.
pub async fn create_meal_slot(
    db: &PgPool,
    plan_id: Uuid,
    meals_of_plan_id: Uuid,
    date: Date,
) -> anyhow::Result<NutritionalPlanHasMeal> {
    let mut tx = db.begin().await.context("begin slot tx")?;
    let inserted = sqlx::query_as::<_, NutritionalPlanHasMeal>(
        r#"
        INSERT INTO nutritional_plan_has_meals (id, nutritional_plan_id, meals_of_plan_id, meal_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (nutritional_plan_id, meals_of_plan_id, meal_date) DO NOTHING
        RETURNING id, nutritional_plan_id, meals_of_plan_id, meal_date
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(plan_id)
    .bind(meals_of_plan_id)
    .bind(date)
    .fetch_optional(&mut *tx)
    .await
    .context("insert meal slot")?;
    tx.commit().await.context("commit slot tx")?;

    match inserted {
        Some(slot) => Ok(slot),
        None => {
            tracing::debug!(%plan_id, %meals_of_plan_id, %date, "meal slot created concurrently");
            find_meal_slot(db, plan_id, meals_of_plan_id, date)
                .await?
                .ok_or_else(|| anyhow::anyhow!("meal slot vanished after conflicting insert"))
        }
    }
}
