use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    error::Error,
    model::{ShortRecipe, Subscription, UserProfile},
};

use super::{error::DatabaseError, user::get_user_profile};

/// Returns `false` when the subscription already existed.
#[tracing::instrument(name = "add subscription", skip_all, fields(user_id, author_id))]
pub async fn add_subscription(pool: &PgPool, user_id: i64, author_id: i64) -> Result<bool, Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO subscriptions
            (user_id, author_id)
        VALUES
            ($1, $2)
        ON CONFLICT (user_id, author_id) DO NOTHING;
    "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .rows_affected();

    Ok(inserted > 0)
}

/// Returns `false` when there was nothing to remove.
#[tracing::instrument(name = "remove subscription", skip_all, fields(user_id, author_id))]
pub async fn remove_subscription(
    pool: &PgPool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, Error> {
    let deleted = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2;")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
        .rows_affected();

    Ok(deleted > 0)
}

#[derive(sqlx::FromRow)]
struct AuthorRecipeRow {
    author_id: i64,
    #[sqlx(flatten)]
    recipe: ShortRecipe,
}

#[derive(sqlx::FromRow)]
struct AuthorRecipeCount {
    author_id: i64,
    count: i64,
}

/// Newest recipes of each author, at most `recipes_limit` per author,
/// together with the total recipe count per author.
#[tracing::instrument(name = "get author recipes", skip_all, fields(recipes_limit))]
async fn get_author_recipes(
    pool: &PgPool,
    author_ids: &[i64],
    recipes_limit: Option<i64>,
) -> Result<(HashMap<i64, Vec<ShortRecipe>>, HashMap<i64, i64>), Error> {
    let rows = sqlx::query_as::<_, AuthorRecipeRow>(
        r#"
        SELECT
            author_id, id, name, image, cooking_time
        FROM (
            SELECT
                recipes.author_id, recipes.id, recipes.name, recipes.image, recipes.cooking_time,
                ROW_NUMBER() OVER (
                    PARTITION BY recipes.author_id
                    ORDER BY recipes.pub_date DESC, recipes.id DESC
                ) AS author_rank
            FROM
                recipes
            WHERE
                recipes.author_id = ANY($1)
        ) ranked
        WHERE
            $2::BIGINT IS NULL OR author_rank <= $2
        ORDER BY author_id, author_rank;
    "#,
    )
    .bind(author_ids)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    let mut recipes: HashMap<i64, Vec<ShortRecipe>> = HashMap::new();
    for row in rows {
        recipes.entry(row.author_id).or_default().push(row.recipe);
    }

    let counts = sqlx::query_as::<_, AuthorRecipeCount>(
        r#"
        SELECT
            author_id, count(*) AS count
        FROM
            recipes
        WHERE
            author_id = ANY($1)
        GROUP BY author_id;
    "#,
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .into_iter()
    .map(|row| (row.author_id, row.count))
    .collect();

    Ok((recipes, counts))
}

fn into_subscriptions(
    authors: Vec<UserProfile>,
    mut recipes: HashMap<i64, Vec<ShortRecipe>>,
    counts: HashMap<i64, i64>,
) -> Vec<Subscription> {
    authors
        .into_iter()
        .map(|author| Subscription {
            recipes: recipes.remove(&author.id).unwrap_or_default(),
            recipes_count: counts.get(&author.id).copied().unwrap_or_default(),
            author,
        })
        .collect()
}

#[tracing::instrument(name = "get subscription", skip_all, fields(user_id, author_id))]
pub async fn get_subscription(
    pool: &PgPool,
    user_id: i64,
    author_id: i64,
    recipes_limit: Option<i64>,
) -> Result<Subscription, Error> {
    let author = get_user_profile(pool, author_id, Some(user_id)).await?;
    let (recipes, counts) = get_author_recipes(pool, &[author_id], recipes_limit).await?;

    into_subscriptions(vec![author], recipes, counts)
        .pop()
        .ok_or(Error::Database(DatabaseError::NotFound))
}

#[tracing::instrument(name = "get subscriptions with pagination", skip_all, fields(user_id))]
pub async fn get_subscriptions_with_pagination(
    pool: &PgPool,
    user_id: i64,
    recipes_limit: Option<i64>,
    limit: i64,
    skip: i64,
) -> Result<(Vec<Subscription>, i64), Error> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM subscriptions WHERE user_id = $1;")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::DatabaseError)?;

    let authors = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT
            users.id, users.email, users.username, users.first_name, users.last_name,
            TRUE AS is_subscribed
        FROM
            subscriptions
        INNER JOIN
            users ON users.id = subscriptions.author_id
        WHERE
            subscriptions.user_id = $1
        ORDER BY users.username
        LIMIT $2
        OFFSET $3;
    "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    if authors.is_empty() {
        return Ok((Vec::new(), count));
    }

    let author_ids: Vec<i64> = authors.iter().map(|a| a.id).collect();
    let (recipes, counts) = get_author_recipes(pool, &author_ids, recipes_limit).await?;

    Ok((into_subscriptions(authors, recipes, counts), count))
}
