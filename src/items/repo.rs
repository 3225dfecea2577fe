use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::{group_rows, Item, ItemFoodRow};

pub async fn list_items(db: &PgPool) -> anyhow::Result<Vec<Item>> {
    let rows = sqlx::query_as::<_, ItemFoodRow>(
        r#"
        SELECT i.id AS item_id, i.description, f.food_id, f.amount_grams
          FROM items i
          LEFT JOIN item_foods f ON f.item_id = i.id
         WHERE i.deleted_at IS NULL
         ORDER BY i.id, f.position
        "#,
    )
    .fetch_all(db)
    .await
    .context("list items")?;
    Ok(group_rows(rows))
}
