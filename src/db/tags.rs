use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Error,
    model::{NewTag, Tag},
};

use super::{PostgresTransaction, error::DatabaseError};

#[tracing::instrument(name = "get tags", skip_all)]
pub async fn get_tags(pool: &PgPool) -> Result<Vec<Tag>, Error> {
    sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY slug;")
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

#[tracing::instrument(name = "get tag by id", skip_all, fields(tag_id))]
pub async fn get_tag_by_id(pool: &PgPool, tag_id: i64) -> Result<Tag, Error> {
    sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1;")
        .bind(tag_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
        .ok_or(Error::Database(DatabaseError::NotFound))
}

/// Returns which of `tag_ids` exist.
#[tracing::instrument(name = "get existing tag ids", skip_all)]
pub async fn get_existing_tag_ids(pool: &PgPool, tag_ids: &[i64]) -> Result<Vec<i64>, Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE id = ANY($1);")
        .bind(tag_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

/// Inserts tags, skipping rows that clash with an existing name, color or
/// slug. Returns how many rows were actually inserted.
#[tracing::instrument(name = "insert tags", skip_all, fields(count = data.len()))]
pub async fn insert_tags(tx: &mut PostgresTransaction, data: &[NewTag]) -> Result<u64, Error> {
    let mut inserted = 0;

    for batch in data.chunks(300) {
        let mut tags_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO tags (name, color, slug) ");

        tags_builder.push_values(batch, |mut b, tag| {
            b.push_bind(&tag.name)
                .push_bind(&tag.color)
                .push_bind(&tag.slug);
        });

        tags_builder.push(" ON CONFLICT DO NOTHING;");

        inserted += tags_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(DatabaseError::DatabaseError)?
            .rows_affected();
    }

    Ok(inserted)
}
