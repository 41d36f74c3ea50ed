mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn super_admin_can_change_roles() {
    let app = TestApp::spawn();
    let (_, admin_token) = app.register("root@example.com", "striker42", "super_admin").await;
    let (player_id, _) = app.register("kid@example.com", "striker42", "player").await;

    let (status, body) = app
        .patch_json(
            &format!("/auth/users/{}/role", player_id),
            &admin_token,
            json!({ "role": "team_coach" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "team_coach");
}

#[tokio::test]
async fn scout_cannot_change_roles() {
    let app = TestApp::spawn();
    let (_, scout_token) = app.register("scout@example.com", "striker42", "talent_scout").await;
    let (player_id, _) = app.register("kid@example.com", "striker42", "player").await;

    let (status, body) = app
        .patch_json(
            &format!("/auth/users/{}/role", player_id),
            &scout_token,
            json!({ "role": "super_admin" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "insufficient_permissions");
    assert_eq!(body["details"]["required"], "manage_roles");
    assert_eq!(body["details"]["role"], "talent_scout");
}

#[tokio::test]
async fn role_change_to_unknown_role_is_rejected() {
    let app = TestApp::spawn();
    let (_, admin_token) = app.register("root@example.com", "striker42", "super_admin").await;
    let (player_id, _) = app.register("kid@example.com", "striker42", "player").await;

    let (status, body) = app
        .patch_json(
            &format!("/auth/users/{}/role", player_id),
            &admin_token,
            json!({ "role": "club_president" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_role");
}

#[tokio::test]
async fn federation_admin_can_deactivate_and_reactivate() {
    let app = TestApp::spawn();
    let (_, admin_token) = app
        .register("fed@example.com", "striker42", "federation_admin")
        .await;
    let (player_id, _) = app.register("kid@example.com", "striker42", "player").await;

    let (status, body) = app
        .post(&format!("/auth/users/{}/deactivate", player_id), Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "deactivated");

    // Deactivation blocks login immediately.
    let (status, body) = app
        .post_json(
            "/auth/login",
            json!({ "email": "kid@example.com", "password": "striker42" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "account_deactivated");

    let (status, body) = app
        .post(&format!("/auth/users/{}/reactivate", player_id), Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "active");

    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "kid@example.com", "password": "striker42" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn player_cannot_deactivate_anyone() {
    let app = TestApp::spawn();
    let (_, player_token) = app.register("kid@example.com", "striker42", "player").await;
    let (other_id, _) = app.register("other@example.com", "striker42", "player").await;

    let (status, body) = app
        .post(&format!("/auth/users/{}/deactivate", other_id), Some(&player_token))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "insufficient_permissions");
}

#[tokio::test]
async fn double_deactivation_is_a_bad_request() {
    let app = TestApp::spawn();
    let (_, admin_token) = app.register("root@example.com", "striker42", "super_admin").await;
    let (player_id, _) = app.register("kid@example.com", "striker42", "player").await;

    let path = format!("/auth/users/{}/deactivate", player_id);
    let (status, _) = app.post(&path, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post(&path, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn unknown_target_is_not_found() {
    let app = TestApp::spawn();
    let (_, admin_token) = app.register("root@example.com", "striker42", "super_admin").await;

    let (status, body) = app
        .post(
            "/auth/users/00000000-0000-0000-0000-000000000000/deactivate",
            Some(&admin_token),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
