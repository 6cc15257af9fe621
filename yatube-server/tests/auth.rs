mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::Harness;
use serde_json::{Value, json};

#[actix_web::test]
async fn signup_issues_usable_token() {
    let harness = Harness::new();
    let app = init_app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({
                "username": "newbie",
                "email": "newbie@example.com",
                "password": "password123"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let token = format!("Bearer {}", body["access_token"].as_str().unwrap());
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .insert_header(("Authorization", token.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn duplicate_signup_conflicts() {
    let harness = Harness::new();
    harness.user("taken").await;
    let app = init_app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({
                "username": "taken",
                "email": "other@example.com",
                "password": "password123"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn invalid_signup_lists_field_errors() {
    let harness = Harness::new();
    let app = init_app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({ "username": "ok", "email": "nope", "password": "short" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["fields"]["email"].is_array());
    assert!(body["details"]["fields"]["password"].is_array());
}

#[actix_web::test]
async fn login_checks_password() {
    let harness = Harness::new();
    harness.user("member").await;
    let app = init_app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "member", "password": "password123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "member", "password": "wrong-password" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_page_echoes_next() {
    let harness = Harness::new();
    let app = init_app!(harness);

    let page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/auth/login/?next=%2Fcreate%2F")
            .to_request(),
    )
    .await;
    assert_eq!(page["next"], "/create/");
}

#[actix_web::test]
async fn bad_token_counts_as_anonymous() {
    let harness = Harness::new();
    harness.user("writer").await;
    let app = init_app!(harness);

    let profile: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/profile/writer/")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(profile["following"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}
