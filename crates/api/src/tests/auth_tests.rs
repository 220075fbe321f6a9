// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use missions_domain::{Group, Permission};
use missions_persistence::{SqlitePersistence, StoredAuditEvent};
use time::{Duration, OffsetDateTime};

use super::helpers::{
    TEST_PASSWORD, create_account, create_fixture, create_test_cause, create_test_event,
};
use crate::{
    ApiError, AuthError, AuthenticationService, AuthorizationService, BootstrapSuperuserRequest,
    LoginFormResponse, LoginRequest, LoginResponse, Principal, authorize_mission_delete,
    authorize_report_generate, bootstrap_superuser, check_bootstrap_status, login, login_form,
    logout,
};

fn login_request(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: String::from(username),
        password: String::from(password),
        next: None,
    }
}

fn bootstrap_request(username: &str) -> BootstrapSuperuserRequest {
    BootstrapSuperuserRequest {
        username: String::from(username),
        password: String::from(TEST_PASSWORD),
        password_confirmation: String::from(TEST_PASSWORD),
        email: String::from("admin@example.com"),
    }
}

#[test]
fn test_login_returns_token_and_redirects_to_index() {
    let mut fixture = create_fixture();

    let response: LoginResponse = login(
        &mut fixture.persistence,
        &login_request("iss", TEST_PASSWORD),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.username, "iss");
    assert_eq!(response.redirect_to, "/");
    assert_eq!(response.session_token.len(), 64);

    let principal: Principal =
        AuthenticationService::validate_session(&mut fixture.persistence, &response.session_token)
            .unwrap();
    assert_eq!(principal.user_id, fixture.iss_admin.user_id);
}

#[test]
fn test_login_follows_local_next_only() {
    let mut fixture = create_fixture();
    let mut request: LoginRequest = login_request("iss", TEST_PASSWORD);

    request.next = Some(String::from("/mission/create"));
    let local: LoginResponse =
        login(&mut fixture.persistence, &request, create_test_cause()).unwrap();
    assert_eq!(local.redirect_to, "/mission/create");

    request.next = Some(String::from("//evil.example/"));
    let offsite: LoginResponse =
        login(&mut fixture.persistence, &request, create_test_cause()).unwrap();
    assert_eq!(offsite.redirect_to, "/");
}

#[test]
fn test_login_form_lists_fields_and_echoes_next() {
    let form: LoginFormResponse = login_form(Some("/audit?limit=5"));
    assert_eq!(form.fields, vec!["username", "password"]);
    assert_eq!(form.next, "/audit?limit=5");

    assert_eq!(login_form(None).next, "/");
    assert_eq!(login_form(Some("https://evil.example/")).next, "/");
}

#[test]
fn test_login_failures_share_one_reason() {
    let mut fixture = create_fixture();

    let wrong_password: ApiError = login(
        &mut fixture.persistence,
        &login_request("iss", "Not-The-Password-1"),
        create_test_cause(),
    )
    .unwrap_err();
    let unknown_user: ApiError = login(
        &mut fixture.persistence,
        &login_request("nobody", TEST_PASSWORD),
        create_test_cause(),
    )
    .unwrap_err();

    assert_eq!(wrong_password, unknown_user);
    assert!(matches!(wrong_password, ApiError::AuthenticationFailed { .. }));
}

#[test]
fn test_login_rejects_inactive_account() {
    let mut fixture = create_fixture();
    let user_id: i64 = fixture.nasa_admin.user_id;
    fixture
        .persistence
        .set_user_active(user_id, false, &create_test_event("Deactivate"))
        .unwrap();

    let result = login(
        &mut fixture.persistence,
        &login_request("nasa", TEST_PASSWORD),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::AuthenticationFailed { .. })));
}

#[test]
fn test_session_of_deactivated_account_is_rejected() {
    let mut fixture = create_fixture();
    let response: LoginResponse = login(
        &mut fixture.persistence,
        &login_request("nasa", TEST_PASSWORD),
        create_test_cause(),
    )
    .unwrap();

    let user_id: i64 = fixture.nasa_admin.user_id;
    fixture
        .persistence
        .set_user_active(user_id, false, &create_test_event("Deactivate"))
        .unwrap();

    let result =
        AuthenticationService::validate_session(&mut fixture.persistence, &response.session_token);
    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
}

#[test]
fn test_expired_session_is_rejected() {
    let mut fixture = create_fixture();
    let user_id: i64 = fixture.iss_admin.user_id;
    let expired_at: OffsetDateTime = OffsetDateTime::now_utc() - Duration::hours(1);
    fixture
        .persistence
        .create_session("expired-token", user_id, expired_at, &create_test_event("Login"))
        .unwrap();

    let result = AuthenticationService::validate_session(&mut fixture.persistence, "expired-token");

    assert!(matches!(
        result,
        Err(AuthError::AuthenticationFailed { ref reason }) if reason == "Session expired"
    ));
}

#[test]
fn test_session_before_expiry_is_accepted() {
    let mut fixture = create_fixture();
    let user_id: i64 = fixture.iss_admin.user_id;
    let expires_at: OffsetDateTime = OffsetDateTime::now_utc() + Duration::minutes(5);
    fixture
        .persistence
        .create_session("fresh-token", user_id, expires_at, &create_test_event("Login"))
        .unwrap();

    let principal: Principal =
        AuthenticationService::validate_session(&mut fixture.persistence, "fresh-token").unwrap();

    assert_eq!(principal.user_id, user_id);
}

#[test]
fn test_unknown_session_token_is_rejected() {
    let mut fixture = create_fixture();

    let result = AuthenticationService::validate_session(&mut fixture.persistence, "deadbeef");

    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
}

#[test]
fn test_logout_invalidates_session() {
    let mut fixture = create_fixture();
    let response: LoginResponse = login(
        &mut fixture.persistence,
        &login_request("iss", TEST_PASSWORD),
        create_test_cause(),
    )
    .unwrap();
    let principal: Principal = fixture.iss_admin.clone();

    logout(
        &mut fixture.persistence,
        &response.session_token,
        &principal,
        create_test_cause(),
    )
    .unwrap();

    let result =
        AuthenticationService::validate_session(&mut fixture.persistence, &response.session_token);
    assert!(result.is_err());
}

#[test]
fn test_login_and_logout_are_audited() {
    let mut fixture = create_fixture();
    let response: LoginResponse = login(
        &mut fixture.persistence,
        &login_request("iss", TEST_PASSWORD),
        create_test_cause(),
    )
    .unwrap();
    let principal: Principal = fixture.iss_admin.clone();
    logout(
        &mut fixture.persistence,
        &response.session_token,
        &principal,
        create_test_cause(),
    )
    .unwrap();

    let events: Vec<StoredAuditEvent> = fixture.persistence.list_recent_audit_events(2).unwrap();
    let names: Vec<&str> = events.iter().map(|e| e.event.action.name.as_str()).collect();
    assert_eq!(names, vec!["Logout", "Login"]);
    assert_eq!(events[1].event.actor.username, "iss");
}

#[test]
fn test_require_denies_missing_permission() {
    let fixture = create_fixture();

    let err: AuthError = AuthorizationService::require(
        &fixture.nasa_admin,
        Permission::AddMission,
        "mission_create",
    )
    .unwrap_err();

    assert_eq!(
        err,
        AuthError::Unauthorized {
            action: String::from("mission_create"),
            required_permission: String::from("missions.add_mission"),
        }
    );
}

#[test]
fn test_method_gates_check_permission_only() {
    let fixture = create_fixture();

    assert!(authorize_mission_delete(&fixture.iss_admin).is_ok());
    assert!(authorize_report_generate(&fixture.iss_admin).is_ok());
    assert!(matches!(
        authorize_mission_delete(&fixture.nasa_admin),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        authorize_report_generate(&fixture.outsider),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_superuser_holds_every_permission() {
    let fixture = create_fixture();

    for permission in Permission::ALL {
        assert!(fixture.superuser.has_perm(permission), "{permission}");
    }
    assert!(AuthorizationService::require_superuser(&fixture.superuser, "list_users").is_ok());
    assert!(AuthorizationService::require_superuser(&fixture.iss_admin, "list_users").is_err());
}

#[test]
fn test_group_permissions_are_inherited() {
    let fixture = create_fixture();

    assert!(fixture.iss_admin.has_perm(Permission::AddMission));
    assert!(fixture.iss_admin.has_perm(Permission::DeleteMissionReport));
    assert!(fixture.nasa_admin.has_perm(Permission::ViewMissionReport));
    assert!(!fixture.nasa_admin.has_perm(Permission::ViewMission));
    assert!(!fixture.outsider.has_perm(Permission::ViewMissionReport));
    assert!(fixture.iss_admin.in_group(Group::IssAdmin));
    assert!(!fixture.iss_admin.in_group(Group::NasaAdmin));
    assert!(fixture.nasa_admin.in_group(Group::NasaAdmin));
}

#[test]
fn test_bootstrap_mode_only_while_no_accounts_exist() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    assert!(
        check_bootstrap_status(&mut persistence)
            .unwrap()
            .is_bootstrap_mode
    );

    let response = bootstrap_superuser(
        &mut persistence,
        &bootstrap_request("admin"),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(response.username, "admin");

    assert!(
        !check_bootstrap_status(&mut persistence)
            .unwrap()
            .is_bootstrap_mode
    );

    let second = bootstrap_superuser(
        &mut persistence,
        &bootstrap_request("intruder"),
        create_test_cause(),
    );
    assert!(matches!(second, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_bootstrap_superuser_can_log_in_with_full_access() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    bootstrap_superuser(
        &mut persistence,
        &bootstrap_request("admin"),
        create_test_cause(),
    )
    .unwrap();

    let response: LoginResponse = login(
        &mut persistence,
        &login_request("admin", TEST_PASSWORD),
        create_test_cause(),
    )
    .unwrap();
    let principal: Principal =
        AuthenticationService::validate_session(&mut persistence, &response.session_token)
            .unwrap();

    assert!(principal.is_superuser);
    assert!(principal.has_perm(Permission::DeleteEmployee));
}

#[test]
fn test_bootstrap_enforces_password_policy() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let mut request: BootstrapSuperuserRequest = bootstrap_request("admin");
    request.password = String::from("short");
    request.password_confirmation = String::from("short");

    let result = bootstrap_superuser(&mut persistence, &request, create_test_cause());

    assert!(matches!(
        result,
        Err(ApiError::PasswordPolicyViolation { .. })
    ));
    assert_eq!(persistence.count_users().unwrap(), 0);
}

#[test]
fn test_bootstrap_rejected_once_any_account_exists() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    create_account(&mut persistence, "someone", false);

    let result = bootstrap_superuser(
        &mut persistence,
        &bootstrap_request("admin"),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}
