use actix_web::{http::StatusCode, test};
use resa::database::repositories::RestaurantRepository;
use resa::database::models::CreateRestaurantRequest;
use serde_json::json;

#[macro_use]
mod common;
use common::TestApp;

#[actix_web::test]
async fn create_then_get_round_trips_by_owner() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;

    let (_, token) = ctx.active_user_with_token("owner@example.com").await;

    let req = test::TestRequest::post()
        .uri("/v1/restaurants")
        .insert_header(common::bearer(&token))
        .set_json(json!({"name": "Joe's Diner", "address": "1 Main St"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let restaurant_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["name"], "Joe's Diner");
    assert_eq!(body["data"]["version"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/v1/restaurants/{restaurant_id}"))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["name"], "Joe's Diner");
    assert_eq!(body["data"]["address"], "1 Main St");
}

/// Scenario 3: a non-owner caller gets 404, never 403, so restaurant ids
/// cannot be probed for existence.
#[actix_web::test]
async fn non_owner_get_is_masked_as_not_found() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;

    let (owner_id, owner_token) = ctx.active_user_with_token("owner@example.com").await;
    let (_, intruder_token) = ctx.active_user_with_token("intruder@example.com").await;

    let restaurant = ctx
        .restaurant_repo
        .create(
            owner_id,
            &CreateRestaurantRequest {
                name: "Joe's Diner".to_string(),
                address: "1 Main St".to_string(),
                phone: None,
            },
        )
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&intruder_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "resource not found");
}

/// Scenario 5: optimistic concurrency — two concurrent updates both
/// reading version=1; the second loses and must re-read/retry.
#[actix_web::test]
async fn concurrent_update_with_stale_version_is_rejected() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;

    let (owner_id, owner_token) = ctx.active_user_with_token("owner@example.com").await;
    let restaurant = ctx
        .restaurant_repo
        .create(
            owner_id,
            &CreateRestaurantRequest {
                name: "Joe's Diner".to_string(),
                address: "1 Main St".to_string(),
                phone: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(restaurant.version, 1);

    let req = test::TestRequest::put()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&owner_token))
        .set_json(json!({"name": "New Name", "address": "1 Main St", "version": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["version"], 2);

    // Second writer still thinks version is 1.
    let req = test::TestRequest::put()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&owner_token))
        .set_json(json!({"name": "Conflicting Name", "address": "1 Main St", "version": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Re-read then retry succeeds.
    let req = test::TestRequest::put()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&owner_token))
        .set_json(json!({"name": "Conflicting Name", "address": "1 Main St", "version": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["version"], 3);
}

#[actix_web::test]
async fn create_rejects_blank_name() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;

    let (_, token) = ctx.active_user_with_token("owner@example.com").await;

    let req = test::TestRequest::post()
        .uri("/v1/restaurants")
        .insert_header(common::bearer(&token))
        .set_json(json!({"name": "", "address": "1 Main St"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn missing_bearer_token_is_unauthorized() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;

    let req = test::TestRequest::get().uri("/v1/restaurants").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn delete_removes_restaurant() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;

    let (owner_id, token) = ctx.active_user_with_token("owner@example.com").await;
    let restaurant = ctx
        .restaurant_repo
        .create(
            owner_id,
            &CreateRestaurantRequest {
                name: "Joe's Diner".to_string(),
                address: "1 Main St".to_string(),
                phone: None,
            },
        )
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/v1/restaurants/{}", restaurant.id))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
