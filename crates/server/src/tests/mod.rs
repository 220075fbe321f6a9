// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod directory_tests;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use missions_api::{FieldCipher, LoginResponse, dev_field_key};
use missions_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use missions_domain::{AccountName, Employee, Group, SecurityClearance};
use missions_persistence::{NewUserAccount, SqlitePersistence};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::{AppState, build_router};

pub const TEST_PASSWORD: &str = "Correct-Horse-42";

/// Employee identifiers created by [`seed`].
pub struct Seeded {
    pub iss_employee_id: i64,
    pub nasa_employee_id: i64,
}

/// Helper to create test app state with in-memory persistence.
pub fn create_test_app_state() -> AppState {
    let persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
    AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        cipher: FieldCipher::new(dev_field_key()),
    }
}

pub fn seed_event(action: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::system(),
        Cause::new(String::from("test-seed"), String::from("Test fixture")),
        Action::new(String::from(action), None),
        None,
        StateSnapshot::absent(),
        StateSnapshot::absent(),
    )
}

fn seed_account(persistence: &mut SqlitePersistence, username: &str, is_superuser: bool) -> i64 {
    let account: NewUserAccount = NewUserAccount {
        username: String::from(username),
        password: String::from(TEST_PASSWORD),
        is_superuser,
        ..NewUserAccount::default()
    };
    persistence
        .create_user(&account, &seed_event("CreateUser"))
        .unwrap()
}

fn seed_employee(persistence: &mut SqlitePersistence, username: &str, group: Group) -> i64 {
    let user_id: i64 = seed_account(persistence, username, false);
    persistence
        .add_user_to_group(user_id, group, &seed_event("AddUserToGroup"))
        .unwrap();
    let employee: Employee = Employee {
        employee_id: None,
        user_id,
        account: AccountName {
            username: String::from(username),
            first_name: String::new(),
            last_name: String::new(),
        },
        division_id: None,
        address: String::new(),
        phone_number: String::new(),
        sealed_social_security_number: None,
        security_clearance: SecurityClearance::Baseline,
    };
    persistence
        .create_employee(&employee, &seed_event("CreateEmployee"))
        .unwrap()
}

/// Creates `root` (superuser), `iss` and `nasa` accounts with profiles.
pub async fn seed(app_state: &AppState) -> Seeded {
    let mut persistence = app_state.persistence.lock().await;
    seed_account(&mut persistence, "root", true);
    let iss_employee_id: i64 = seed_employee(&mut persistence, "iss", Group::IssAdmin);
    let nasa_employee_id: i64 = seed_employee(&mut persistence, "nasa", Group::NasaAdmin);
    Seeded {
        iss_employee_id,
        nasa_employee_id,
    }
}

pub fn create_test_app() -> (AppState, Router) {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    (app_state, app)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

/// Logs in through the router and returns the session token.
pub async fn login_token(app: &Router, username: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/login",
            None,
            &serde_json::json!({ "username": username, "password": TEST_PASSWORD }),
        ),
    )
    .await;
    let login: LoginResponse = read_json(response).await;
    login.session_token
}
