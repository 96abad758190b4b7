use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};
use foodgram::{
    db::{error::DatabaseError, recipes::create_recipe, shopping_list::add_to_shopping_list},
    error::Error,
};

use crate::{
    AppStateTest, empty_request, fake_recipe_record, get_request, insert_fake_ingredient,
    insert_fake_recipe, insert_fake_tag, read_text,
};

#[tokio::test]
async fn store_and_destroy_should_manage_cart() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let author = test_state.generate_user().await;
    let recipe_id = insert_fake_recipe(&test_state.app_state.pool, author.id).await;
    let uri = format!("/api/recipes/{}/shopping_cart", recipe_id);

    let response = test_state
        .generate_response(empty_request("POST", &uri, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = test_state
        .generate_response(empty_request("POST", &uri, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test_state
        .generate_response(empty_request("DELETE", &uri, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = test_state
        .generate_response(empty_request("DELETE", &uri, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/recipes/{}/shopping_cart", recipe_id + 1000),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}

#[tokio::test]
async fn download_should_be_error_when_cart_is_empty() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;

    let response = test_state
        .generate_response(get_request("/api/recipes/download_shopping_cart", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    test_state.cleanup().await;
}

#[tokio::test]
async fn download_should_aggregate_ingredients() {
    let mut test_state = AppStateTest::new(true).await;
    let (user, token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let tag = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;
    let milk = insert_fake_ingredient(pool, "milk", "ml").await;
    let eggs = insert_fake_ingredient(pool, "eggs", "pcs").await;

    let mut pancakes = fake_recipe_record(vec![tag.id], vec![(flour.id, 200), (milk.id, 300)]);
    pancakes.name = "Pancakes".to_string();
    let mut bread = fake_recipe_record(vec![tag.id], vec![(flour.id, 500), (eggs.id, 2)]);
    bread.name = "Bread".to_string();

    for record in [&pancakes, &bread] {
        let recipe_id = create_recipe(pool, user.id, record).await.unwrap();
        let response = test_state
            .generate_response(empty_request(
                "POST",
                &format!("/api/recipes/{}/shopping_cart", recipe_id),
                Some(&token),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = test_state
        .generate_response(get_request("/api/recipes/download_shopping_cart", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("{}_shopping_list.txt", user.username)));

    let document = read_text(response).await;
    assert!(document.contains("1. eggs (pcs) - 2"));
    assert!(document.contains("2. flour (g) - 700"));
    assert!(document.contains("3. milk (ml) - 300"));
    assert!(document.contains("Pancakes"));
    assert!(document.contains("Bread"));

    test_state.cleanup().await;
}

#[tokio::test]
async fn add_to_shopping_list_should_report_missing_recipe_as_not_found() {
    let mut test_state = AppStateTest::new(true).await;
    let user = test_state.generate_user().await;

    let error = add_to_shopping_list(&test_state.app_state.pool, user.id, 4242)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::Database(DatabaseError::ForeignKeyViolation(_))
    ));
    assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}
