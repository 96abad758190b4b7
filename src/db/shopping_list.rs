use sqlx::PgPool;

use crate::{error::Error, model::ShoppingListItem};

use super::error::DatabaseError;

/// Returns `false` when the recipe was already in the cart. A recipe
/// deleted in the meantime surfaces as `ForeignKeyViolation`.
#[tracing::instrument(name = "add to shopping list", skip_all, fields(user_id, recipe_id))]
pub async fn add_to_shopping_list(
    pool: &PgPool,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO shopping_lists
            (user_id, recipe_id)
        VALUES
            ($1, $2)
        ON CONFLICT (user_id, recipe_id) DO NOTHING;
    "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::from)?
    .rows_affected();

    Ok(inserted > 0)
}

/// Returns `false` when the recipe was not in the cart.
#[tracing::instrument(name = "remove from shopping list", skip_all, fields(user_id, recipe_id))]
pub async fn remove_from_shopping_list(
    pool: &PgPool,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, Error> {
    let deleted =
        sqlx::query("DELETE FROM shopping_lists WHERE user_id = $1 AND recipe_id = $2;")
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await
            .map_err(DatabaseError::DatabaseError)?
            .rows_affected();

    Ok(deleted > 0)
}

/// Names of the recipes in the cart, oldest addition first.
#[tracing::instrument(name = "get shopping list recipes", skip_all, fields(user_id))]
pub async fn get_shopping_list_recipe_names(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<String>, Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT
            recipes.name
        FROM
            shopping_lists
        INNER JOIN
            recipes ON recipes.id = shopping_lists.recipe_id
        WHERE
            shopping_lists.user_id = $1
        ORDER BY shopping_lists.id;
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

/// Sums ingredient amounts over every recipe in the cart, one row per
/// (ingredient, measurement unit).
#[tracing::instrument(name = "aggregate shopping list", skip_all, fields(user_id))]
pub async fn get_shopping_list_items(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ShoppingListItem>, Error> {
    sqlx::query_as::<_, ShoppingListItem>(
        r#"
        SELECT
            ingredients.name,
            ingredients.measurement_unit,
            SUM(recipe_ingredients.amount)::BIGINT AS amount
        FROM
            recipe_ingredients
        INNER JOIN
            shopping_lists ON shopping_lists.recipe_id = recipe_ingredients.recipe_id
        INNER JOIN
            ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE
            shopping_lists.user_id = $1
        GROUP BY
            ingredients.name, ingredients.measurement_unit
        ORDER BY ingredients.name, ingredients.measurement_unit;
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}
