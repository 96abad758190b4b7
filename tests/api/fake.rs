use fake::{Fake, faker::lorem::en::Sentence};
use foodgram::{
    db::recipes::{RecipeRecord, create_recipe},
    model::{Ingredient, Tag},
};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_fake_tag(pool: &PgPool) -> Tag {
    let mut rng = rand::rng();
    let color = format!("#{:06X}", rng.random_range(0..=0xFFFFFF_u32));
    let suffix = Uuid::new_v4().simple().to_string();

    sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name, color, slug)
        VALUES ($1, $2, $3)
        RETURNING id, name, color, slug;
    "#,
    )
    .bind(format!("Tag {}", &suffix[..8]))
    .bind(color)
    .bind(format!("tag-{}", &suffix[..8]))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_fake_ingredient(pool: &PgPool, name: &str, measurement_unit: &str) -> Ingredient {
    sqlx::query_as::<_, Ingredient>(
        r#"
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        RETURNING id, name, measurement_unit;
    "#,
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn fake_recipe_record(tag_ids: Vec<i64>, ingredients: Vec<(i64, i32)>) -> RecipeRecord {
    RecipeRecord {
        name: format!("Recipe {}", &Uuid::new_v4().simple().to_string()[..8]),
        text: Sentence(3..8).fake(),
        cooking_time: (5..120).fake(),
        image: "recipes/images/fake.png".to_string(),
        tag_ids,
        ingredients,
    }
}

/// Inserts a recipe with one fresh tag and one fresh ingredient.
pub async fn insert_fake_recipe(pool: &PgPool, author_id: i64) -> i64 {
    let tag = insert_fake_tag(pool).await;
    let suffix = Uuid::new_v4().simple().to_string();
    let ingredient = insert_fake_ingredient(pool, &format!("ingredient {}", &suffix[..8]), "g").await;

    let record = fake_recipe_record(vec![tag.id], vec![(ingredient.id, 100)]);

    create_recipe(pool, author_id, &record).await.unwrap()
}
