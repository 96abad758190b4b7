use sqlx::PgPool;

use crate::error::Error;

use super::error::DatabaseError;

/// Returns `false` when the recipe was already a favorite. A recipe
/// deleted in the meantime surfaces as `ForeignKeyViolation`.
#[tracing::instrument(name = "add favorite", skip_all, fields(user_id, recipe_id))]
pub async fn add_favorite(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<bool, Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO favorites
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

/// Returns `false` when the recipe was not a favorite.
#[tracing::instrument(name = "remove favorite", skip_all, fields(user_id, recipe_id))]
pub async fn remove_favorite(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<bool, Error> {
    let deleted = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2;")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
        .rows_affected();

    Ok(deleted > 0)
}
