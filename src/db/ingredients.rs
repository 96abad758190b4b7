use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Error,
    model::{Ingredient, NewIngredient},
};

use super::{PostgresTransaction, error::DatabaseError};

/// Escapes LIKE wildcards so user input matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[tracing::instrument(name = "get ingredients", skip_all, fields(name))]
pub async fn get_ingredients(pool: &PgPool, name: Option<&str>) -> Result<Vec<Ingredient>, Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, name, measurement_unit FROM ingredients");

    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        builder
            .push(" WHERE lower(name) LIKE lower(")
            .push_bind(format!("{}%", escape_like(name)))
            .push(")");
    }

    builder.push(" ORDER BY name;");

    builder
        .build_query_as::<Ingredient>()
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

#[tracing::instrument(name = "get ingredient by id", skip_all, fields(ingredient_id))]
pub async fn get_ingredient_by_id(pool: &PgPool, ingredient_id: i64) -> Result<Ingredient, Error> {
    sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1;",
    )
    .bind(ingredient_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

/// Returns which of `ingredient_ids` exist.
#[tracing::instrument(name = "get existing ingredient ids", skip_all)]
pub async fn get_existing_ingredient_ids(
    pool: &PgPool,
    ingredient_ids: &[i64],
) -> Result<Vec<i64>, Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM ingredients WHERE id = ANY($1);")
        .bind(ingredient_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

/// Inserts ingredients, skipping (name, unit) pairs that already exist.
/// Returns how many rows were actually inserted.
#[tracing::instrument(name = "insert ingredients", skip_all, fields(count = data.len()))]
pub async fn insert_ingredients(
    tx: &mut PostgresTransaction,
    data: &[NewIngredient],
) -> Result<u64, Error> {
    let mut inserted = 0;

    for batch in data.chunks(1000) {
        let mut ingredients_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

        ingredients_builder.push_values(batch, |mut b, ingredient| {
            b.push_bind(&ingredient.name)
                .push_bind(&ingredient.measurement_unit);
        });

        ingredients_builder.push(" ON CONFLICT DO NOTHING;");

        inserted += ingredients_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(DatabaseError::DatabaseError)?
            .rows_affected();
    }

    Ok(inserted)
}
