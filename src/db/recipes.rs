use std::collections::HashMap;

use futures::TryStreamExt;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Error,
    model::{IngredientAmount, Recipe, ShortRecipe, Tag, UserProfile},
};

use super::{PostgresTransaction, error::DatabaseError};

/// Query-string filters for the recipe list.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    /// Tag slugs, a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

/// Validated recipe fields ready to be written.
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub tag_ids: Vec<i64>,
    /// (ingredient id, amount)
    pub ingredients: Vec<(i64, i32)>,
}

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
    image: String,
    text: String,
    cooking_time: i32,
    author_id: i64,
    author_email: String,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
    author_is_subscribed: bool,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

#[derive(sqlx::FromRow)]
struct RecipeTagRow {
    recipe_id: i64,
    #[sqlx(flatten)]
    tag: Tag,
}

#[derive(sqlx::FromRow)]
struct RecipeIngredientRow {
    recipe_id: i64,
    id: i64,
    name: String,
    measurement_unit: String,
    amount: i32,
}

/// Author and stored image of a recipe, used for permission checks.
#[derive(sqlx::FromRow, Debug)]
pub struct RecipeOwnership {
    pub author_id: i64,
    pub image: String,
}

fn push_recipe_select(builder: &mut QueryBuilder<Postgres>, viewer_id: Option<i64>) {
    builder.push(
        r#"
        SELECT
            recipes.id, recipes.name, recipes.image, recipes.text, recipes.cooking_time,
            users.id AS author_id,
            users.email AS author_email,
            users.username AS author_username,
            users.first_name AS author_first_name,
            users.last_name AS author_last_name,
            EXISTS (
                SELECT 1 FROM subscriptions
                WHERE subscriptions.author_id = recipes.author_id AND subscriptions.user_id = "#,
    );
    builder.push_bind(viewer_id);
    builder.push(
        r#"
            ) AS author_is_subscribed,
            EXISTS (
                SELECT 1 FROM favorites
                WHERE favorites.recipe_id = recipes.id AND favorites.user_id = "#,
    );
    builder.push_bind(viewer_id);
    builder.push(
        r#"
            ) AS is_favorited,
            EXISTS (
                SELECT 1 FROM shopping_lists
                WHERE shopping_lists.recipe_id = recipes.id AND shopping_lists.user_id = "#,
    );
    builder.push_bind(viewer_id);
    builder.push(
        r#"
            ) AS is_in_shopping_cart
        FROM
            recipes
        INNER JOIN
            users ON users.id = recipes.author_id
        "#,
    );
}

fn push_recipe_filters(
    builder: &mut QueryBuilder<Postgres>,
    filter: &RecipeFilter,
    viewer_id: Option<i64>,
) {
    builder.push(" WHERE TRUE");

    if let Some(author) = filter.author {
        builder.push(" AND recipes.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        builder
            .push(
                r#" AND EXISTS (
                SELECT 1 FROM recipe_tags
                INNER JOIN tags ON tags.id = recipe_tags.tag_id
                WHERE recipe_tags.recipe_id = recipes.id AND tags.slug = ANY("#,
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }

    // saved-state filters only mean something for a known viewer
    let Some(viewer_id) = viewer_id else {
        return;
    };

    for (flag, table) in [
        (filter.is_favorited, "favorites"),
        (filter.is_in_shopping_cart, "shopping_lists"),
    ] {
        let Some(flag) = flag else {
            continue;
        };

        builder
            .push(if flag { " AND EXISTS (" } else { " AND NOT EXISTS (" })
            .push(format!(
                "SELECT 1 FROM {table} WHERE {table}.recipe_id = recipes.id AND {table}.user_id = "
            ))
            .push_bind(viewer_id)
            .push(")");
    }
}

impl RecipeRow {
    fn into_recipe(
        self,
        tags: &mut HashMap<i64, Vec<Tag>>,
        ingredients: &mut HashMap<i64, Vec<IngredientAmount>>,
    ) -> Recipe {
        Recipe {
            id: self.id,
            tags: tags.remove(&self.id).unwrap_or_default(),
            author: UserProfile {
                id: self.author_id,
                email: self.author_email,
                username: self.author_username,
                first_name: self.author_first_name,
                last_name: self.author_last_name,
                is_subscribed: self.author_is_subscribed,
            },
            ingredients: ingredients.remove(&self.id).unwrap_or_default(),
            is_favorited: self.is_favorited,
            is_in_shopping_cart: self.is_in_shopping_cart,
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
        }
    }
}

#[tracing::instrument(name = "get recipe relations", skip_all)]
async fn get_recipe_relations(
    pool: &PgPool,
    recipe_ids: &[i64],
) -> Result<(HashMap<i64, Vec<Tag>>, HashMap<i64, Vec<IngredientAmount>>), Error> {
    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
    let mut tag_stream = sqlx::query_as::<_, RecipeTagRow>(
        r#"
        SELECT
            recipe_tags.recipe_id, tags.id, tags.name, tags.color, tags.slug
        FROM
            recipe_tags
        INNER JOIN
            tags ON recipe_tags.tag_id = tags.id
        WHERE
            recipe_tags.recipe_id = ANY($1)
        ORDER BY tags.slug;
    "#,
    )
    .bind(recipe_ids)
    .fetch(pool);

    while let Some(row) = tag_stream
        .try_next()
        .await
        .map_err(DatabaseError::DatabaseError)?
    {
        tags.entry(row.recipe_id).or_default().push(row.tag);
    }

    let mut ingredients: HashMap<i64, Vec<IngredientAmount>> = HashMap::new();
    let mut ingredient_stream = sqlx::query_as::<_, RecipeIngredientRow>(
        r#"
        SELECT
            recipe_ingredients.recipe_id, ingredients.id, ingredients.name,
            ingredients.measurement_unit, recipe_ingredients.amount
        FROM
            recipe_ingredients
        INNER JOIN
            ingredients ON recipe_ingredients.ingredient_id = ingredients.id
        WHERE
            recipe_ingredients.recipe_id = ANY($1)
        ORDER BY recipe_ingredients.id;
    "#,
    )
    .bind(recipe_ids)
    .fetch(pool);

    while let Some(row) = ingredient_stream
        .try_next()
        .await
        .map_err(DatabaseError::DatabaseError)?
    {
        ingredients
            .entry(row.recipe_id)
            .or_default()
            .push(IngredientAmount {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
    }

    Ok((tags, ingredients))
}

#[tracing::instrument(name = "get recipes with pagination", skip_all, fields(?filter, viewer_id))]
pub async fn get_recipes_with_pagination(
    pool: &PgPool,
    filter: &RecipeFilter,
    viewer_id: Option<i64>,
    limit: i64,
    skip: i64,
) -> Result<(Vec<Recipe>, i64), Error> {
    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT count(*) FROM recipes");
    push_recipe_filters(&mut count_builder, filter, viewer_id);
    let count = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    if count == 0 {
        return Ok((Vec::new(), 0));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    push_recipe_select(&mut builder, viewer_id);
    push_recipe_filters(&mut builder, filter, viewer_id);
    builder
        .push(" ORDER BY recipes.pub_date DESC, recipes.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let rows = builder
        .build_query_as::<RecipeRow>()
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    if rows.is_empty() {
        return Ok((Vec::new(), count));
    }

    let recipe_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let (mut tags, mut ingredients) = get_recipe_relations(pool, &recipe_ids).await?;

    let recipes = rows
        .into_iter()
        .map(|row| row.into_recipe(&mut tags, &mut ingredients))
        .collect();

    Ok((recipes, count))
}

#[tracing::instrument(name = "get recipe by id", skip_all, fields(recipe_id, viewer_id))]
pub async fn get_recipe_by_id(
    pool: &PgPool,
    recipe_id: i64,
    viewer_id: Option<i64>,
) -> Result<Recipe, Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    push_recipe_select(&mut builder, viewer_id);
    builder.push(" WHERE recipes.id = ").push_bind(recipe_id);

    let row = match builder
        .build_query_as::<RecipeRow>()
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
    {
        Some(row) => row,
        None => {
            return Err(Error::Database(DatabaseError::NotFound));
        }
    };

    let (mut tags, mut ingredients) = get_recipe_relations(pool, &[recipe_id]).await?;

    Ok(row.into_recipe(&mut tags, &mut ingredients))
}

#[tracing::instrument(name = "get short recipe", skip_all, fields(recipe_id))]
pub async fn get_short_recipe(pool: &PgPool, recipe_id: i64) -> Result<Option<ShortRecipe>, Error> {
    sqlx::query_as::<_, ShortRecipe>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1;",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

#[tracing::instrument(name = "recipe exists", skip_all, fields(recipe_id))]
pub async fn recipe_exists(pool: &PgPool, recipe_id: i64) -> Result<bool, Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1);")
        .bind(recipe_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

#[tracing::instrument(name = "get recipe ownership", skip_all, fields(recipe_id))]
pub async fn get_recipe_ownership(pool: &PgPool, recipe_id: i64) -> Result<RecipeOwnership, Error> {
    sqlx::query_as::<_, RecipeOwnership>("SELECT author_id, image FROM recipes WHERE id = $1;")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
        .ok_or(Error::Database(DatabaseError::NotFound))
}

async fn insert_recipe_relations(
    tx: &mut PostgresTransaction,
    recipe_id: i64,
    record: &RecipeRecord,
) -> Result<(), Error> {
    let mut tags_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    tags_builder.push_values(&record.tag_ids, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });
    tags_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    let mut ingredients_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
    );
    ingredients_builder.push_values(&record.ingredients, |mut b, (ingredient_id, amount)| {
        b.push_bind(recipe_id)
            .push_bind(*ingredient_id)
            .push_bind(*amount);
    });
    ingredients_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    Ok(())
}

#[tracing::instrument(name = "create recipe", skip_all, fields(author_id))]
pub async fn create_recipe(
    pool: &PgPool,
    author_id: i64,
    record: &RecipeRecord,
) -> Result<i64, Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::DatabaseError)?;

    let recipe_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO recipes
            (author_id, name, image, text, cooking_time)
        VALUES
            ($1, $2, $3, $4, $5)
        RETURNING id;
    "#,
    )
    .bind(author_id)
    .bind(&record.name)
    .bind(&record.image)
    .bind(&record.text)
    .bind(record.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    insert_recipe_relations(&mut tx, recipe_id, record).await?;

    tx.commit().await.map_err(DatabaseError::DatabaseError)?;

    Ok(recipe_id)
}

/// Replaces every field of the recipe, tags and ingredients included.
#[tracing::instrument(name = "update recipe", skip_all, fields(recipe_id))]
pub async fn update_recipe(
    pool: &PgPool,
    recipe_id: i64,
    record: &RecipeRecord,
) -> Result<(), Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::DatabaseError)?;

    let updated = sqlx::query(
        r#"
        UPDATE recipes
        SET
            name = $1,
            image = $2,
            text = $3,
            cooking_time = $4
        WHERE
            id = $5;
    "#,
    )
    .bind(&record.name)
    .bind(&record.image)
    .bind(&record.text)
    .bind(record.cooking_time)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .rows_affected();

    if updated == 0 {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1;")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::DatabaseError)?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1;")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    insert_recipe_relations(&mut tx, recipe_id, record).await?;

    tx.commit().await.map_err(DatabaseError::DatabaseError)?;

    Ok(())
}

#[tracing::instrument(name = "delete recipe", skip_all, fields(recipe_id))]
pub async fn delete_recipe(pool: &PgPool, recipe_id: i64) -> Result<(), Error> {
    let deleted = sqlx::query("DELETE FROM recipes WHERE id = $1;")
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
        .rows_affected();

    if deleted == 0 {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    Ok(())
}
