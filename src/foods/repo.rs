use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::{Food, FoodCategory};

/// Every non-deleted food together with the meal types it may be served at.
pub async fn list_foods(db: &PgPool) -> anyhow::Result<Vec<Food>> {
    let rows = sqlx::query_as::<_, Food>(
        r#"
        SELECT f.id, f.description,
               f.proteins, f.lipids, f.carbohydrates, f.energy,
               f.potassium, f.phosphorus, f.sodium,
               f.food_category_id,
               COALESCE(
                   array_agg(c.type_of_meal_id ORDER BY c.type_of_meal_id)
                       FILTER (WHERE c.type_of_meal_id IS NOT NULL),
                   '{}'
               ) AS can_eat_at
          FROM foods f
          LEFT JOIN food_can_eat_at c ON c.food_id = f.id
         WHERE f.deleted_at IS NULL
         GROUP BY f.id
         ORDER BY f.id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list foods")?;
    Ok(rows)
}

pub async fn list_categories(db: &PgPool) -> anyhow::Result<Vec<FoodCategory>> {
    let rows = sqlx::query_as::<_, FoodCategory>(
        r#"
        SELECT id, description, level, parent_id
          FROM food_categories
         WHERE deleted_at IS NULL
         ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list food categories")?;
    Ok(rows)
}
