use axum::http::StatusCode;
use foodgram::{
    model::{Ingredient, Recipe, Tag},
    pagination::Page,
};
use serde_json::{Value, json};

use crate::{
    AppStateTest, FAKE_IMAGE, empty_request, get_request, insert_fake_ingredient,
    insert_fake_recipe, insert_fake_tag, json_request, read_json,
};

fn recipe_body(tags: &[&Tag], ingredients: &[(&Ingredient, i32)]) -> Value {
    json!({
        "tags": tags.iter().map(|tag| tag.id).collect::<Vec<_>>(),
        "ingredients": ingredients
            .iter()
            .map(|(ingredient, amount)| json!({ "id": ingredient.id, "amount": amount }))
            .collect::<Vec<_>>(),
        "image": FAKE_IMAGE,
        "name": "Pancakes",
        "text": "Mix everything and fry.",
        "cooking_time": 15,
    })
}

async fn create_recipe_via_api(test_state: &AppStateTest, token: &str, body: Value) -> Recipe {
    let response = test_state
        .generate_response(json_request("POST", "/api/recipes", Some(token), body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    read_json(response).await
}

#[tokio::test]
async fn store_should_create_recipe_and_image() {
    let mut test_state = AppStateTest::new(true).await;
    let (user, token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let tag = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;
    let milk = insert_fake_ingredient(pool, "milk", "ml").await;

    let recipe = create_recipe_via_api(
        &test_state,
        &token,
        recipe_body(&[&tag], &[(&flour, 200), (&milk, 300)]),
    )
    .await;

    assert_eq!(recipe.name, "Pancakes");
    assert_eq!(recipe.author.id, user.id);
    assert_eq!(recipe.tags, vec![tag]);
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredients[0].name, "flour");
    assert_eq!(recipe.ingredients[0].amount, 200);
    assert!(!recipe.is_favorited);
    assert!(!recipe.is_in_shopping_cart);

    let relative = recipe.image.strip_prefix("/media/").unwrap();
    assert!(relative.ends_with(".png"));
    assert!(test_state.media_dir.path().join(relative).exists());

    let response = test_state
        .generate_response(get_request(&recipe.image, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    test_state.cleanup().await;
}

#[tokio::test]
async fn store_should_require_authentication() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(json_request("POST", "/api/recipes", None, json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn store_should_validate_body() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let tag = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;

    let mut invalid_bodies = Vec::new();

    let mut body = recipe_body(&[], &[(&flour, 200)]);
    invalid_bodies.push((body.clone(), "tags"));

    body = recipe_body(&[&tag, &tag], &[(&flour, 200)]);
    invalid_bodies.push((body.clone(), "tags"));

    body = recipe_body(&[&tag], &[]);
    invalid_bodies.push((body.clone(), "ingredients"));

    body = recipe_body(&[&tag], &[(&flour, 200), (&flour, 100)]);
    invalid_bodies.push((body.clone(), "ingredients"));

    body = recipe_body(&[&tag], &[(&flour, 0)]);
    invalid_bodies.push((body.clone(), "ingredients"));

    body = recipe_body(&[&tag], &[(&flour, 200)]);
    body["cooking_time"] = json!(0);
    invalid_bodies.push((body.clone(), "cooking_time"));

    body = recipe_body(&[&tag], &[(&flour, 200)]);
    body["name"] = json!("");
    invalid_bodies.push((body.clone(), "name"));

    body = recipe_body(&[&tag], &[(&flour, 200)]);
    body["image"] = json!("data:image/png;base64,bm90IGFuIGltYWdl");
    invalid_bodies.push((body.clone(), "image"));

    body = recipe_body(&[&tag], &[(&flour, 200)]);
    body["tags"] = json!([tag.id + 1000]);
    invalid_bodies.push((body.clone(), "tags"));

    body = recipe_body(&[&tag], &[(&flour, 200)]);
    body["ingredients"] = json!([{ "id": flour.id + 1000, "amount": 1 }]);
    invalid_bodies.push((body, "ingredients"));

    for (body, field) in invalid_bodies {
        let response = test_state
            .generate_response(json_request("POST", "/api/recipes", Some(&token), body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "field {}", field);

        let errors: Value = read_json(response).await;
        assert!(errors.get(field).is_some(), "field {}: {}", field, errors);
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM recipes")
        .fetch_one(&test_state.app_state.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    test_state.cleanup().await;
}

#[tokio::test]
async fn store_should_reject_mistyped_body_as_bad_request() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let tag = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;

    let mut body = recipe_body(&[&tag], &[(&flour, 200)]);
    body["cooking_time"] = json!("soon");

    let response = test_state
        .generate_response(json_request("POST", "/api/recipes", Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let errors: Value = read_json(response).await;
    assert!(errors["errors"].as_str().unwrap().contains("cooking_time"));

    test_state.cleanup().await;
}

#[tokio::test]
async fn update_should_replace_fields_and_image() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let breakfast = insert_fake_tag(pool).await;
    let dinner = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;
    let eggs = insert_fake_ingredient(pool, "eggs", "pcs").await;

    let recipe = create_recipe_via_api(
        &test_state,
        &token,
        recipe_body(&[&breakfast], &[(&flour, 200)]),
    )
    .await;
    let old_image = test_state
        .media_dir
        .path()
        .join(recipe.image.strip_prefix("/media/").unwrap());

    let mut body = recipe_body(&[&dinner], &[(&eggs, 2)]);
    body["name"] = json!("Omelette");
    let response = test_state
        .generate_response(json_request(
            "PATCH",
            &format!("/api/recipes/{}", recipe.id),
            Some(&token),
            body,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated: Recipe = read_json(response).await;
    assert_eq!(updated.id, recipe.id);
    assert_eq!(updated.name, "Omelette");
    assert_eq!(updated.tags, vec![dinner]);
    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].id, eggs.id);
    assert_ne!(updated.image, recipe.image);
    assert!(!old_image.exists());

    test_state.cleanup().await;
}

#[tokio::test]
async fn update_and_destroy_should_be_limited_to_author() {
    let mut test_state = AppStateTest::new(true).await;
    let (author, _) = test_state.generate_jwt_with_user().await;
    let (_, stranger_token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let recipe_id = insert_fake_recipe(pool, author.id).await;
    let tag = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;
    let uri = format!("/api/recipes/{}", recipe_id);

    let response = test_state
        .generate_response(json_request(
            "PATCH",
            &uri,
            Some(&stranger_token),
            recipe_body(&[&tag], &[(&flour, 1)]),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = test_state
        .generate_response(empty_request("DELETE", &uri, Some(&stranger_token)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = test_state
        .generate_response(empty_request("DELETE", &uri, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = test_state
        .generate_response(empty_request(
            "DELETE",
            &format!("/api/recipes/{}", recipe_id + 1000),
            Some(&stranger_token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}

#[tokio::test]
async fn destroy_should_remove_recipe_and_image() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let pool = &test_state.app_state.pool;
    let tag = insert_fake_tag(pool).await;
    let flour = insert_fake_ingredient(pool, "flour", "g").await;

    let recipe =
        create_recipe_via_api(&test_state, &token, recipe_body(&[&tag], &[(&flour, 5)])).await;
    let image = test_state
        .media_dir
        .path()
        .join(recipe.image.strip_prefix("/media/").unwrap());
    let uri = format!("/api/recipes/{}", recipe.id);

    let response = test_state
        .generate_response(empty_request("DELETE", &uri, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!image.exists());

    let response = test_state.generate_response(get_request(&uri, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}

#[tokio::test]
async fn index_should_list_newest_first_and_filter() {
    let mut test_state = AppStateTest::new(true).await;
    let (viewer, token) = test_state.generate_jwt_with_user().await;
    let author = test_state.generate_user().await;
    let pool = &test_state.app_state.pool;

    let first = insert_fake_recipe(pool, author.id).await;
    let second = insert_fake_recipe(pool, author.id).await;
    let own = insert_fake_recipe(pool, viewer.id).await;

    let response = test_state
        .generate_response(get_request("/api/recipes", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 3);
    let ids: Vec<i64> = page.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![own, second, first]);

    let response = test_state
        .generate_response(get_request(&format!("/api/recipes?author={}", author.id), None))
        .await;
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 2);

    let response = test_state
        .generate_response(get_request(&format!("/api/recipes/{}", first), None))
        .await;
    let recipe: Recipe = read_json(response).await;
    let slug = recipe.tags[0].slug.clone();

    let response = test_state
        .generate_response(get_request(
            &format!("/api/recipes?tags={},unknown-slug", slug),
            None,
        ))
        .await;
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, first);

    test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/recipes/{}/favorite", second),
            Some(&token),
        ))
        .await;
    test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/recipes/{}/shopping_cart", first),
            Some(&token),
        ))
        .await;

    let response = test_state
        .generate_response(get_request("/api/recipes?is_favorited=1", Some(&token)))
        .await;
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, second);
    assert!(page.results[0].is_favorited);

    let response = test_state
        .generate_response(get_request("/api/recipes?is_favorited=0", Some(&token)))
        .await;
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 2);

    let response = test_state
        .generate_response(get_request(
            "/api/recipes?is_in_shopping_cart=1",
            Some(&token),
        ))
        .await;
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, first);
    assert!(page.results[0].is_in_shopping_cart);

    // saved-state filters are ignored for anonymous viewers
    let response = test_state
        .generate_response(get_request("/api/recipes?is_favorited=1", None))
        .await;
    let page: Page<Recipe> = read_json(response).await;
    assert_eq!(page.count, 3);
    assert!(page.results.iter().all(|r| !r.is_favorited));

    test_state.cleanup().await;
}

#[tokio::test]
async fn show_should_reflect_author_subscription() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let author = test_state.generate_user().await;
    let recipe_id = insert_fake_recipe(&test_state.app_state.pool, author.id).await;
    let uri = format!("/api/recipes/{}", recipe_id);

    let response = test_state.generate_response(get_request(&uri, Some(&token))).await;
    let recipe: Recipe = read_json(response).await;
    assert!(!recipe.author.is_subscribed);

    test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/users/{}/subscribe", author.id),
            Some(&token),
        ))
        .await;

    let response = test_state.generate_response(get_request(&uri, Some(&token))).await;
    let recipe: Recipe = read_json(response).await;
    assert!(recipe.author.is_subscribed);

    test_state.cleanup().await;
}
