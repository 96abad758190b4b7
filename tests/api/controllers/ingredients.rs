use axum::http::StatusCode;
use foodgram::model::Ingredient;

use crate::{AppStateTest, get_request, insert_fake_ingredient, read_json};

#[tokio::test]
async fn index_should_search_by_name_prefix() {
    let mut test_state = AppStateTest::new(true).await;
    let pool = &test_state.app_state.pool;
    insert_fake_ingredient(pool, "Sugar", "g").await;
    insert_fake_ingredient(pool, "sugar syrup", "ml").await;
    insert_fake_ingredient(pool, "brown sugar", "g").await;
    insert_fake_ingredient(pool, "100%_cocoa", "g").await;

    let response = test_state
        .generate_response(get_request("/api/ingredients", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let ingredients: Vec<Ingredient> = read_json(response).await;
    assert_eq!(ingredients.len(), 4);

    let response = test_state
        .generate_response(get_request("/api/ingredients?name=SUG", None))
        .await;
    let ingredients: Vec<Ingredient> = read_json(response).await;
    let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Sugar", "sugar syrup"]);

    // LIKE wildcards are matched literally
    let response = test_state
        .generate_response(get_request("/api/ingredients?name=100%25_", None))
        .await;
    let ingredients: Vec<Ingredient> = read_json(response).await;
    assert_eq!(ingredients.len(), 1);

    let response = test_state
        .generate_response(get_request("/api/ingredients?name=_", None))
        .await;
    let ingredients: Vec<Ingredient> = read_json(response).await;
    assert!(ingredients.is_empty());

    test_state.cleanup().await;
}

#[tokio::test]
async fn show_should_return_ingredient_or_not_found() {
    let mut test_state = AppStateTest::new(true).await;
    let ingredient = insert_fake_ingredient(&test_state.app_state.pool, "salt", "g").await;

    let response = test_state
        .generate_response(get_request(&format!("/api/ingredients/{}", ingredient.id), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let found: Ingredient = read_json(response).await;
    assert_eq!(found, ingredient);

    let response = test_state
        .generate_response(get_request(
            &format!("/api/ingredients/{}", ingredient.id + 1),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}
