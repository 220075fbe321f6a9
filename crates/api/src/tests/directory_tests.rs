// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use missions_audit::{AuditTarget, TargetKind};
use missions_domain::{Employee, Group, Permission};
use missions_persistence::StoredAuditEvent;

use super::helpers::{
    TEST_PASSWORD, create_account, create_fixture, create_test_cause, test_cipher,
};
use crate::{
    AddToGroupRequest, ApiError, AuthenticationService, CreateDivisionRequest, CreateUserRequest,
    DeletedResponse, EmployeeForm, EmployeeInfo, FieldCipher, GrantPermissionRequest,
    ListAuditEventsResponse, LoginRequest, Principal, SetActiveRequest, UserInfo,
    add_user_to_group, create_division, create_employee, create_user, delete_division,
    delete_employee, grant_user_permission, list_audit_events, list_divisions, list_employees,
    list_users, login, set_user_active,
};

fn user_request(username: &str, groups: Vec<Group>) -> CreateUserRequest {
    CreateUserRequest {
        username: String::from(username),
        password: String::from(TEST_PASSWORD),
        password_confirmation: String::from(TEST_PASSWORD),
        first_name: String::from("Sally"),
        last_name: String::from("Ride"),
        email: format!("{username}@example.com"),
        is_superuser: false,
        groups,
    }
}

fn employee_form(user_id: i64, ssn: &str) -> EmployeeForm {
    EmployeeForm {
        user_id,
        division: None,
        address: String::from("2101 E NASA Pkwy"),
        phone_number: String::from("281-483-0123"),
        social_security_number: String::from(ssn),
        security_clearance: Some(3),
    }
}

#[test]
fn test_superuser_creates_user_with_groups() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let created: UserInfo = create_user(
        &mut fixture.persistence,
        &principal,
        &user_request("sride", vec![Group::NasaAdmin]),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(created.username, "sride");
    assert_eq!(created.groups, vec![Group::NasaAdmin]);
    assert!(created.is_active);
    assert!(!created.is_superuser);
}

#[test]
fn test_create_user_with_groups_writes_one_audit_event() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let before: usize = fixture
        .persistence
        .list_recent_audit_events(1000)
        .unwrap()
        .len();

    let created: UserInfo = create_user(
        &mut fixture.persistence,
        &principal,
        &user_request("mjemison", vec![Group::IssAdmin, Group::NasaAdmin]),
        create_test_cause(),
    )
    .unwrap();

    let events: Vec<StoredAuditEvent> = fixture
        .persistence
        .list_audit_events_for_target(AuditTarget::new(TargetKind::Account, created.user_id))
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.action.name, "CreateUser");
    assert!(events[0].event.after.data.contains("NASA_Admin_User"));
    assert_eq!(
        fixture
            .persistence
            .list_recent_audit_events(1000)
            .unwrap()
            .len(),
        before + 1
    );
    assert_eq!(created.groups, vec![Group::IssAdmin, Group::NasaAdmin]);
}

#[test]
fn test_duplicate_username_violates_uniqueness() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let result = create_user(
        &mut fixture.persistence,
        &principal,
        &user_request("iss", Vec::new()),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "unique"
    ));
}

#[test]
fn test_password_matching_username_is_rejected() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let mut request: CreateUserRequest = user_request("Longusername9!", Vec::new());
    request.password = String::from("longusername9!");
    request.password_confirmation = String::from("longusername9!");

    let result = create_user(
        &mut fixture.persistence,
        &principal,
        &request,
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::PasswordPolicyViolation { .. })
    ));
}

#[test]
fn test_directory_management_is_superuser_only() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.iss_admin.clone();

    assert!(matches!(
        list_users(&mut fixture.persistence, &principal),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        create_user(
            &mut fixture.persistence,
            &principal,
            &user_request("sneaky", Vec::new()),
            create_test_cause(),
        ),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        list_audit_events(&mut fixture.persistence, &principal, None),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_list_users_includes_groups() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let users: Vec<UserInfo> = list_users(&mut fixture.persistence, &principal)
        .unwrap()
        .users;

    assert_eq!(users.len(), 4);
    let iss: &UserInfo = users.iter().find(|u| u.username == "iss").unwrap();
    assert_eq!(iss.groups, vec![Group::IssAdmin]);
}

#[test]
fn test_add_user_to_group_grants_group_permissions() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let outsider: Principal = fixture.outsider.clone();

    let updated: UserInfo = add_user_to_group(
        &mut fixture.persistence,
        &principal,
        outsider.user_id,
        &AddToGroupRequest {
            group: Group::NasaAdmin,
        },
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(updated.groups, vec![Group::NasaAdmin]);
    let reloaded: Principal = fixture.reload(&outsider);
    assert!(reloaded.has_perm(Permission::ViewMissionReport));
}

#[test]
fn test_add_unknown_user_to_group_is_not_found() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let result = add_user_to_group(
        &mut fixture.persistence,
        &principal,
        9999,
        &AddToGroupRequest {
            group: Group::IssAdmin,
        },
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_divisions_are_created_and_listed() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    create_division(
        &mut fixture.persistence,
        &principal,
        &CreateDivisionRequest {
            name: String::from("Flight Operations"),
        },
        create_test_cause(),
    )
    .unwrap();

    let divisions = list_divisions(&mut fixture.persistence, &principal)
        .unwrap()
        .divisions;
    assert_eq!(divisions.len(), 1);
    assert_eq!(divisions[0].name, "Flight Operations");
}

#[test]
fn test_blank_division_name_is_invalid() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let result = create_division(
        &mut fixture.persistence,
        &principal,
        &CreateDivisionRequest {
            name: String::from("   "),
        },
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "name"
    ));
}

#[test]
fn test_division_permissions_are_not_granted_to_groups() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.iss_admin.clone();

    let result = list_divisions(&mut fixture.persistence, &principal);

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_employee_ssn_is_sealed_and_listed_masked() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let cipher: FieldCipher = test_cipher();
    let user_id: i64 = create_account(&mut fixture.persistence, "glenn", false);

    let created = create_employee(
        &mut fixture.persistence,
        &principal,
        &cipher,
        &employee_form(user_id, "123-45-6789"),
        create_test_cause(),
    )
    .unwrap();

    let stored: Employee = fixture
        .persistence
        .get_employee(created.id)
        .unwrap()
        .unwrap();
    let sealed: String = stored.sealed_social_security_number.unwrap();
    assert!(!sealed.contains("123456789"));
    assert_eq!(cipher.open(&sealed).unwrap(), "123456789");

    let listed: Vec<EmployeeInfo> = list_employees(&mut fixture.persistence, &principal, &cipher)
        .unwrap()
        .employees;
    let glenn: &EmployeeInfo = listed.iter().find(|e| e.username == "glenn").unwrap();
    assert_eq!(glenn.social_security_number.as_deref(), Some("***-**-6789"));
    assert_eq!(glenn.security_clearance, 3);
}

#[test]
fn test_employee_audit_snapshot_omits_ssn() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let user_id: i64 = create_account(&mut fixture.persistence, "glenn", false);

    create_employee(
        &mut fixture.persistence,
        &principal,
        &test_cipher(),
        &employee_form(user_id, "123-45-6789"),
        create_test_cause(),
    )
    .unwrap();

    let latest = list_audit_events(&mut fixture.persistence, &principal, Some(1))
        .unwrap()
        .events
        .remove(0);
    assert_eq!(latest.action_name, "CreateEmployee");
    assert!(latest.after.contains("\"sealed_social_security_number\":null"));
    assert!(!latest.after.contains("6789"));
}

#[test]
fn test_second_profile_for_account_is_rejected() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let iss_user: i64 = fixture.iss_admin.user_id;

    let result = create_employee(
        &mut fixture.persistence,
        &principal,
        &test_cipher(),
        &employee_form(iss_user, ""),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "one_profile_per_account"
    ));
}

#[test]
fn test_malformed_ssn_is_a_field_error() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let user_id: i64 = create_account(&mut fixture.persistence, "glenn", false);

    let err: ApiError = create_employee(
        &mut fixture.persistence,
        &principal,
        &test_cipher(),
        &employee_form(user_id, "12-345"),
        create_test_cause(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ApiError::InvalidForm { ref errors } if errors.contains("social_security_number")
    ));
}

#[test]
fn test_audit_listing_is_newest_first_and_limited() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let response: ListAuditEventsResponse =
        list_audit_events(&mut fixture.persistence, &principal, Some(3)).unwrap();

    assert_eq!(response.events.len(), 3);
    assert!(response.events[0].event_id > response.events[1].event_id);
    assert!(response.events[1].event_id > response.events[2].event_id);

    let invalid = list_audit_events(&mut fixture.persistence, &principal, Some(0));
    assert!(matches!(invalid, Err(ApiError::InvalidInput { .. })));
}

#[test]
fn test_direct_grant_lets_account_list_divisions() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let iss: Principal = fixture.iss_admin.clone();
    let request: GrantPermissionRequest =
        serde_json::from_str(r#"{"permission":"missions.view_division"}"#).unwrap();

    let updated: UserInfo = grant_user_permission(
        &mut fixture.persistence,
        &principal,
        iss.user_id,
        &request,
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(updated.permissions, vec![Permission::ViewDivision]);
    let reloaded: Principal = fixture.reload(&iss);
    assert!(list_divisions(&mut fixture.persistence, &reloaded).is_ok());
    assert!(matches!(
        create_division(
            &mut fixture.persistence,
            &reloaded,
            &CreateDivisionRequest {
                name: String::from("Range Safety"),
            },
            create_test_cause(),
        ),
        Err(ApiError::Unauthorized { .. })
    ));

    let events: Vec<StoredAuditEvent> = fixture
        .persistence
        .list_audit_events_for_target(AuditTarget::new(TargetKind::Account, iss.user_id))
        .unwrap();
    assert_eq!(events.last().unwrap().event.action.name, "GrantPermission");
}

#[test]
fn test_grant_permission_is_superuser_only() {
    let mut fixture = create_fixture();
    let iss: Principal = fixture.iss_admin.clone();

    let result = grant_user_permission(
        &mut fixture.persistence,
        &iss,
        iss.user_id,
        &GrantPermissionRequest {
            permission: Permission::AddDivision,
        },
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_deactivation_ends_sessions_and_blocks_login() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let nasa: Principal = fixture.nasa_admin.clone();
    let token: String = login(
        &mut fixture.persistence,
        &LoginRequest {
            username: String::from("nasa"),
            password: String::from(TEST_PASSWORD),
            next: None,
        },
        create_test_cause(),
    )
    .unwrap()
    .session_token;

    let updated: UserInfo = set_user_active(
        &mut fixture.persistence,
        &principal,
        nasa.user_id,
        &SetActiveRequest { is_active: false },
        create_test_cause(),
    )
    .unwrap();

    assert!(!updated.is_active);
    assert!(AuthenticationService::validate_session(&mut fixture.persistence, &token).is_err());
    assert!(matches!(
        login(
            &mut fixture.persistence,
            &LoginRequest {
                username: String::from("nasa"),
                password: String::from(TEST_PASSWORD),
                next: None,
            },
            create_test_cause(),
        ),
        Err(ApiError::AuthenticationFailed { .. })
    ));

    let reactivated: UserInfo = set_user_active(
        &mut fixture.persistence,
        &principal,
        nasa.user_id,
        &SetActiveRequest { is_active: true },
        create_test_cause(),
    )
    .unwrap();
    assert!(reactivated.is_active);
}

#[test]
fn test_superuser_cannot_deactivate_self() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();

    let result = set_user_active(
        &mut fixture.persistence,
        &principal,
        principal.user_id,
        &SetActiveRequest { is_active: false },
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "cannot_deactivate_self"
    ));
}

#[test]
fn test_delete_division_detaches_employees() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let cipher: FieldCipher = test_cipher();
    let division_id: i64 = create_division(
        &mut fixture.persistence,
        &principal,
        &CreateDivisionRequest {
            name: String::from("Life Sciences"),
        },
        create_test_cause(),
    )
    .unwrap()
    .id;
    let user_id: i64 = create_account(&mut fixture.persistence, "glenn", false);
    let mut form: EmployeeForm = employee_form(user_id, "");
    form.division = Some(division_id);
    let employee_id: i64 = create_employee(
        &mut fixture.persistence,
        &principal,
        &cipher,
        &form,
        create_test_cause(),
    )
    .unwrap()
    .id;

    let deleted: DeletedResponse = delete_division(
        &mut fixture.persistence,
        &principal,
        division_id,
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(deleted.redirect_to, "/directory/divisions");
    assert!(
        fixture
            .persistence
            .get_division(division_id)
            .unwrap()
            .is_none()
    );
    let employee: Employee = fixture
        .persistence
        .get_employee(employee_id)
        .unwrap()
        .unwrap();
    assert_eq!(employee.division_id, None);

    let again = delete_division(
        &mut fixture.persistence,
        &principal,
        division_id,
        create_test_cause(),
    );
    assert!(matches!(again, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_delete_division_requires_permission() {
    let mut fixture = create_fixture();
    let iss: Principal = fixture.iss_admin.clone();

    let result = delete_division(&mut fixture.persistence, &iss, 1, create_test_cause());

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_delete_employee_keeps_account_and_omits_ssn_from_audit() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.superuser.clone();
    let user_id: i64 = create_account(&mut fixture.persistence, "glenn", false);
    let employee_id: i64 = create_employee(
        &mut fixture.persistence,
        &principal,
        &test_cipher(),
        &employee_form(user_id, "123-45-6789"),
        create_test_cause(),
    )
    .unwrap()
    .id;

    delete_employee(
        &mut fixture.persistence,
        &principal,
        employee_id,
        create_test_cause(),
    )
    .unwrap();

    assert!(
        fixture
            .persistence
            .get_employee(employee_id)
            .unwrap()
            .is_none()
    );
    assert!(fixture.persistence.get_user_by_id(user_id).unwrap().is_some());

    let latest = list_audit_events(&mut fixture.persistence, &principal, Some(1))
        .unwrap()
        .events
        .remove(0);
    assert_eq!(latest.action_name, "DeleteEmployee");
    assert!(!latest.before.contains("6789"));

    let missing = delete_employee(
        &mut fixture.persistence,
        &principal,
        employee_id,
        create_test_cause(),
    );
    assert!(matches!(missing, Err(ApiError::ResourceNotFound { .. })));
}
