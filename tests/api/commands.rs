use std::path::Path;

use foodgram::commands::import::{
    FileFormat, parse_ingredients, parse_tags, store_ingredients, store_tags,
};

use crate::AppStateTest;

#[tokio::test]
async fn bundled_data_should_import_once() {
    let mut test_state = AppStateTest::new(true).await;
    let pool = &test_state.app_state.pool;

    let path = Path::new("data/ingredients.csv");
    let content = std::fs::read_to_string(path).unwrap();
    let ingredients = parse_ingredients(FileFormat::from_path(path).unwrap(), &content).unwrap();
    assert!(!ingredients.is_empty());

    let inserted = store_ingredients(pool, &ingredients).await.unwrap();
    assert_eq!(inserted, ingredients.len() as u64);
    let inserted = store_ingredients(pool, &ingredients).await.unwrap();
    assert_eq!(inserted, 0);

    let path = Path::new("data/tags.json");
    let content = std::fs::read_to_string(path).unwrap();
    let tags = parse_tags(FileFormat::from_path(path).unwrap(), &content).unwrap();

    let inserted = store_tags(pool, &tags).await.unwrap();
    assert_eq!(inserted, tags.len() as u64);
    let inserted = store_tags(pool, &tags).await.unwrap();
    assert_eq!(inserted, 0);

    let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM tags")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, tags.len() as i64);

    test_state.cleanup().await;
}
