use axum::http::StatusCode;
use foodgram::{model::Subscription, pagination::Page};
use serde_json::Value;

use crate::{
    AppStateTest, empty_request, get_request, insert_fake_recipe, read_json,
};

#[tokio::test]
async fn store_should_subscribe_and_preview_recipes() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let author = test_state.generate_user().await;
    for _ in 0..3 {
        insert_fake_recipe(&test_state.app_state.pool, author.id).await;
    }

    let response = test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/users/{}/subscribe?recipes_limit=2", author.id),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let subscription: Subscription = read_json(response).await;
    assert_eq!(subscription.author.id, author.id);
    assert!(subscription.author.is_subscribed);
    assert_eq!(subscription.recipes.len(), 2);
    assert_eq!(subscription.recipes_count, 3);
    assert!(subscription.recipes[0].image.starts_with("/media/"));

    let response = test_state
        .generate_response(get_request(&format!("/api/users/{}", author.id), Some(&token)))
        .await;
    let profile: Value = read_json(response).await;
    assert_eq!(profile["is_subscribed"], true);

    test_state.cleanup().await;
}

#[tokio::test]
async fn store_should_reject_self_duplicate_and_unknown_author() {
    let mut test_state = AppStateTest::new(true).await;
    let (user, token) = test_state.generate_jwt_with_user().await;
    let author = test_state.generate_user().await;

    let response = test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/users/{}/subscribe", user.id),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let subscribe = format!("/api/users/{}/subscribe", author.id);
    let response = test_state
        .generate_response(empty_request("POST", &subscribe, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = test_state
        .generate_response(empty_request("POST", &subscribe, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test_state
        .generate_response(empty_request(
            "POST",
            &format!("/api/users/{}/subscribe", author.id + 1000),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}

#[tokio::test]
async fn destroy_should_unsubscribe_once() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let author = test_state.generate_user().await;
    let subscribe = format!("/api/users/{}/subscribe", author.id);

    let response = test_state
        .generate_response(empty_request("DELETE", &subscribe, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    test_state
        .generate_response(empty_request("POST", &subscribe, Some(&token)))
        .await;

    let response = test_state
        .generate_response(empty_request("DELETE", &subscribe, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = test_state
        .generate_response(empty_request("DELETE", &subscribe, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    test_state.cleanup().await;
}

#[tokio::test]
async fn index_should_list_only_own_subscriptions() {
    let mut test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user().await;
    let (_, other_token) = test_state.generate_jwt_with_user().await;
    let first = test_state.generate_user().await;
    let second = test_state.generate_user().await;
    insert_fake_recipe(&test_state.app_state.pool, first.id).await;

    for author in [&first, &second] {
        test_state
            .generate_response(empty_request(
                "POST",
                &format!("/api/users/{}/subscribe", author.id),
                Some(&token),
            ))
            .await;
    }

    let response = test_state
        .generate_response(get_request(
            "/api/users/subscriptions?recipes_limit=0",
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page: Page<Subscription> = read_json(response).await;
    assert_eq!(page.count, 2);
    assert!(page.results.iter().all(|s| s.recipes.is_empty()));
    assert!(page.results.iter().all(|s| s.author.is_subscribed));
    let first_entry = page
        .results
        .iter()
        .find(|s| s.author.id == first.id)
        .unwrap();
    assert_eq!(first_entry.recipes_count, 1);

    let response = test_state
        .generate_response(get_request("/api/users/subscriptions", Some(&other_token)))
        .await;
    let page: Page<Subscription> = read_json(response).await;
    assert_eq!(page.count, 0);
    assert!(page.results.is_empty());

    test_state.cleanup().await;
}

#[tokio::test]
async fn index_should_require_authentication() {
    let test_state = AppStateTest::new(false).await;

    let response = test_state
        .generate_response(get_request("/api/users/subscriptions", None))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
