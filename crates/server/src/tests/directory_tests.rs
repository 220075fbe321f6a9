// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::{
    Router,
    http::{StatusCode as HttpStatusCode, header},
};
use missions_api::{
    CreatedResponse, DeletedResponse, ListDivisionsResponse, ListUsersResponse, UserInfo,
};
use missions_domain::Permission;

use super::{
    Seeded, TEST_PASSWORD, create_test_app, empty_request, json_request, login_token, read_json,
    seed, send,
};
use crate::ErrorResponse;

async fn user_id(app: &Router, root: &str, username: &str) -> i64 {
    let users: ListUsersResponse =
        read_json(send(app, empty_request("GET", "/directory/users", Some(root))).await).await;
    users
        .users
        .iter()
        .find(|u| u.username == username)
        .unwrap()
        .user_id
}

#[tokio::test]
async fn test_granted_permission_opens_division_listing() {
    let (app_state, app) = create_test_app();
    seed(&app_state).await;
    let root: String = login_token(&app, "root").await;
    let iss: String = login_token(&app, "iss").await;
    let iss_id: i64 = user_id(&app, &root, "iss").await;

    let before = send(&app, empty_request("GET", "/directory/divisions", Some(&iss))).await;
    assert_eq!(before.status(), HttpStatusCode::FORBIDDEN);

    let granted = send(
        &app,
        json_request(
            "POST",
            &format!("/directory/users/{iss_id}/permissions"),
            Some(&root),
            &serde_json::json!({ "permission": "missions.view_division" }),
        ),
    )
    .await;
    assert_eq!(granted.status(), HttpStatusCode::OK);
    let user: UserInfo = read_json(granted).await;
    assert_eq!(user.permissions, vec![Permission::ViewDivision]);

    let after = send(&app, empty_request("GET", "/directory/divisions", Some(&iss))).await;
    assert_eq!(after.status(), HttpStatusCode::OK);
    let body: ListDivisionsResponse = read_json(after).await;
    assert!(body.divisions.is_empty());
}

#[tokio::test]
async fn test_unknown_permission_codename_is_rejected() {
    let (app_state, app) = create_test_app();
    seed(&app_state).await;
    let root: String = login_token(&app, "root").await;
    let iss_id: i64 = user_id(&app, &root, "iss").await;

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/directory/users/{iss_id}/permissions"),
            Some(&root),
            &serde_json::json!({ "permission": "missions.launch_rocket" }),
        ),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_deactivated_account_is_sent_back_to_login() {
    let (app_state, app) = create_test_app();
    seed(&app_state).await;
    let root: String = login_token(&app, "root").await;
    let nasa: String = login_token(&app, "nasa").await;
    let nasa_id: i64 = user_id(&app, &root, "nasa").await;

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/directory/users/{nasa_id}/active"),
            Some(&root),
            &serde_json::json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(response.status(), HttpStatusCode::OK);
    let user: UserInfo = read_json(response).await;
    assert!(!user.is_active);

    let index = send(&app, empty_request("GET", "/", Some(&nasa))).await;
    assert_eq!(index.status(), HttpStatusCode::FOUND);
    assert_eq!(index.headers().get(header::LOCATION).unwrap(), "/login?next=/");

    let login = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            &serde_json::json!({ "username": "nasa", "password": TEST_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(login.status(), HttpStatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_management_is_superuser_only() {
    let (app_state, app) = create_test_app();
    seed(&app_state).await;
    let root: String = login_token(&app, "root").await;
    let iss: String = login_token(&app, "iss").await;
    let nasa_id: i64 = user_id(&app, &root, "nasa").await;

    let active = send(
        &app,
        json_request(
            "POST",
            &format!("/directory/users/{nasa_id}/active"),
            Some(&iss),
            &serde_json::json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(active.status(), HttpStatusCode::FORBIDDEN);

    let grant = send(
        &app,
        json_request(
            "POST",
            &format!("/directory/users/{nasa_id}/permissions"),
            Some(&iss),
            &serde_json::json!({ "permission": "add_mission" }),
        ),
    )
    .await;
    assert_eq!(grant.status(), HttpStatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_division_and_employee() {
    let (app_state, app) = create_test_app();
    let seeded: Seeded = seed(&app_state).await;
    let root: String = login_token(&app, "root").await;

    let division: CreatedResponse = read_json(
        send(
            &app,
            json_request(
                "POST",
                "/directory/divisions",
                Some(&root),
                &serde_json::json!({ "name": "Robotics" }),
            ),
        )
        .await,
    )
    .await;

    let deleted = send(
        &app,
        empty_request(
            "POST",
            &format!("/directory/divisions/{}/delete", division.id),
            Some(&root),
        ),
    )
    .await;
    assert_eq!(deleted.status(), HttpStatusCode::OK);
    let body: DeletedResponse = read_json(deleted).await;
    assert_eq!(body.redirect_to, "/directory/divisions");

    let again = send(
        &app,
        empty_request(
            "POST",
            &format!("/directory/divisions/{}/delete", division.id),
            Some(&root),
        ),
    )
    .await;
    assert_eq!(again.status(), HttpStatusCode::NOT_FOUND);

    let iss: String = login_token(&app, "iss").await;
    let forbidden = send(
        &app,
        empty_request(
            "POST",
            &format!("/directory/employees/{}/delete", seeded.nasa_employee_id),
            Some(&iss),
        ),
    )
    .await;
    assert_eq!(forbidden.status(), HttpStatusCode::FORBIDDEN);
    let error: ErrorResponse = read_json(forbidden).await;
    assert!(error.error);

    let employee = send(
        &app,
        empty_request(
            "POST",
            &format!("/directory/employees/{}/delete", seeded.nasa_employee_id),
            Some(&root),
        ),
    )
    .await;
    assert_eq!(employee.status(), HttpStatusCode::OK);
    assert!(
        app_state
            .persistence
            .lock()
            .await
            .get_employee(seeded.nasa_employee_id)
            .unwrap()
            .is_none()
    );
}
