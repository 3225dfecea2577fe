use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{Consumption, Specificity, SpecificityRow};

/// LIKE / DONT_LIKE rows of a user.
pub async fn list_user_preferences(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Specificity>> {
    let rows = sqlx::query_as::<_, SpecificityRow>(
        r#"
        SELECT id, user_id, food_id, specificity_type
          FROM specificities
         WHERE user_id = $1
           AND specificity_type IN ('LIKE', 'DONT_LIKE')
           AND deleted_at IS NULL
         ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list user preferences")?;

    rows.into_iter().map(Specificity::try_from).collect()
}

/// Foods the user must not be served under this plan: explicit allergies,
/// intolerances and sensitivities plus the plan's forbidden foods.
pub async fn list_forbidden_food_ids(
    db: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> anyhow::Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT food_id
          FROM specificities
         WHERE user_id = $1
           AND specificity_type IN ('ALLERGIC', 'INTOLERANT', 'SENSITIVE')
           AND deleted_at IS NULL
        UNION
        SELECT food_id
          FROM forbidden_foods
         WHERE nutritional_plan_id = $2
        "#,
    )
    .bind(user_id)
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("list forbidden foods")?;
    Ok(ids)
}

/// Per-food consumption count from the diary since `since` (inclusive).
pub async fn list_consumption(
    db: &PgPool,
    user_id: Uuid,
    since: Date,
) -> anyhow::Result<Vec<Consumption>> {
    let rows = sqlx::query_as::<_, Consumption>(
        r#"
        SELECT itf.food_id, COUNT(*)::BIGINT AS count
          FROM diaries d
          JOIN nutritional_plan_has_meals nphm ON nphm.id = d.nutritional_plan_has_meal_id
          JOIN nutritional_plans np ON np.id = nphm.nutritional_plan_id
          JOIN item_foods itf ON itf.item_id = d.item_id
         WHERE np.user_id = $1
           AND nphm.meal_date >= $2
         GROUP BY itf.food_id
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await
    .context("list consumption")?;
    Ok(rows)
}

pub async fn list_fatigued_food_ids(
    db: &PgPool,
    user_id: Uuid,
    since: Date,
    threshold: i64,
) -> anyhow::Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT itf.food_id
          FROM diaries d
          JOIN nutritional_plan_has_meals nphm ON nphm.id = d.nutritional_plan_has_meal_id
          JOIN nutritional_plans np ON np.id = nphm.nutritional_plan_id
          JOIN item_foods itf ON itf.item_id = d.item_id
         WHERE np.user_id = $1
           AND nphm.meal_date >= $2
         GROUP BY itf.food_id
        HAVING COUNT(*) >= $3
        "#,
    )
    .bind(user_id)
    .bind(since)
    .bind(threshold)
    .fetch_all(db)
    .await
    .context("list fatigued foods")?;
    Ok(ids)
}
