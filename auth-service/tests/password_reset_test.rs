mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn reset_flow_replaces_the_password() {
    let app = TestApp::spawn();
    app.register("kid@example.com", "striker42", "player").await;

    let (status, _) = app
        .post_json(
            "/auth/password-reset/request",
            json!({ "email": "kid@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let raw_token = app.last_email_token();
    let (status, _) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": raw_token, "new_password": "keeper77x" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works; the new one does.
    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "kid@example.com", "password": "striker42" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "kid@example.com", "password": "keeper77x" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_email_gets_the_same_answer_and_no_email() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/auth/password-reset/request",
            json!({ "email": "nobody@example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(app.emails.sent().is_empty());
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let app = TestApp::spawn();
    app.register("kid@example.com", "striker42", "player").await;

    app.post_json(
        "/auth/password-reset/request",
        json!({ "email": "kid@example.com" }),
    )
    .await;
    let raw_token = app.last_email_token();

    let (status, _) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": raw_token, "new_password": "keeper77x" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": raw_token, "new_password": "another9y" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn weak_replacement_password_is_rejected_and_token_spent() {
    let app = TestApp::spawn();
    app.register("kid@example.com", "striker42", "player").await;

    app.post_json(
        "/auth/password-reset/request",
        json!({ "email": "kid@example.com" }),
    )
    .await;
    let raw_token = app.last_email_token();

    let (status, body) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": raw_token, "new_password": "abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "weak_password");

    // The original password still works.
    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "kid@example.com", "password": "striker42" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn verification_token_cannot_be_spent_as_a_reset_token() {
    let app = TestApp::spawn();
    app.register("kid@example.com", "striker42", "player").await;
    // The registration email carries an email-verification token.
    let raw_token = app.last_email_token();

    let (status, _) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": raw_token, "new_password": "keeper77x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
