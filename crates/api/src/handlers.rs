// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every handler checks permissions before it looks anything up, so a
//! principal without access cannot learn which records exist. Every
//! successful mutation writes exactly one audit event in the same
//! transaction as the change.

use std::collections::BTreeSet;

use missions_audit::{Action, Actor, AuditEvent, AuditTarget, Cause, StateSnapshot, TargetKind};
use missions_domain::{
    DomainError, Division, Employee, Group, IndexScope, Mission, MissionReport, Permission,
    SecurityClearance, next_report_title, resolve_index_scope, validate_division_name,
    validate_report_fields,
};
use missions_persistence::{
    NewUserAccount, SessionData, SqlitePersistence, StoredAuditEvent, UserAccountData,
};
use num_traits::ToPrimitive;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::auth::{AuthenticationService, AuthorizationService, Principal};
use crate::capabilities::{can_add_mission, compute_mission_capabilities};
use crate::error::ApiError;
use crate::field_encryption::FieldCipher;
use crate::forms::{CleanedReportForm, clean_employee_form, clean_mission_form, clean_report_form};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    AddToGroupRequest, AuditEventInfo, BootstrapStatusResponse, BootstrapSuperuserRequest,
    BootstrapSuperuserResponse, ClearanceChoice, CreateDivisionRequest, CreateUserRequest,
    CreatedResponse, DeletedResponse, DivisionInfo, EmployeeChoice, EmployeeForm, EmployeeInfo,
    GenerateReportForm, GrantPermissionRequest, IndexResponse, ListAuditEventsResponse,
    ListDivisionsResponse, ListEmployeesResponse, ListUsersResponse, LoginFormResponse,
    LoginRequest, LoginResponse, LogoutResponse, MissionDetailsResponse, MissionForm,
    MissionFormChoices, MissionFormResponse, MissionInfo, MissionReportDetailsResponse,
    MissionReportInfo, SetActiveRequest, UpdatedResponse, UserInfo,
};

/// Number of audit events returned when no limit is given.
pub const DEFAULT_AUDIT_LIMIT: i64 = 100;

/// Fields submitted by the login form.
const LOGIN_FORM_FIELDS: [&str; 2] = ["username", "password"];

// ============================================================================
// Helpers
// ============================================================================

/// Serializes a value into an audit snapshot.
fn snapshot<T: Serialize>(value: &T) -> Result<StateSnapshot, ApiError> {
    serde_json::to_string(value)
        .map(StateSnapshot::new)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to serialize audit snapshot: {e}"),
        })
}

/// Builds an audit event attributed to the principal.
fn audit_event(
    principal: &Principal,
    cause: Cause,
    action: &str,
    details: String,
    target: Option<AuditTarget>,
    before: StateSnapshot,
    after: StateSnapshot,
) -> AuditEvent {
    AuditEvent::new(
        principal.to_audit_actor(),
        cause,
        Action::new(action.to_string(), Some(details)),
        target,
        before,
        after,
    )
}

fn load_mission(persistence: &mut SqlitePersistence, mission_id: i64) -> Result<Mission, ApiError> {
    persistence
        .get_mission(mission_id)?
        .ok_or_else(|| DomainError::MissionNotFound(mission_id).into())
}

fn load_report(
    persistence: &mut SqlitePersistence,
    report_id: i64,
) -> Result<MissionReport, ApiError> {
    persistence
        .get_report(report_id)?
        .ok_or_else(|| DomainError::MissionReportNotFound(report_id).into())
}

fn employee_choice(employee: &Employee) -> Option<EmployeeChoice> {
    employee.employee_id.map(|employee_id| EmployeeChoice {
        employee_id,
        display_name: employee.display_name(),
    })
}

fn employee_choices(employees: &[Employee]) -> Vec<EmployeeChoice> {
    employees.iter().filter_map(employee_choice).collect()
}

fn mission_infos(missions: &[Mission]) -> Result<Vec<MissionInfo>, ApiError> {
    missions.iter().map(MissionInfo::from_mission).collect()
}

fn report_infos(reports: &[MissionReport]) -> Result<Vec<MissionReportInfo>, ApiError> {
    reports.iter().map(MissionReportInfo::from_report).collect()
}

fn mission_form_choices(
    persistence: &mut SqlitePersistence,
) -> Result<MissionFormChoices, ApiError> {
    let supervisors: Vec<Employee> = persistence.list_employees_in_group(Group::IssAdmin)?;
    let divisions: Vec<Division> = persistence.list_divisions()?;

    Ok(MissionFormChoices {
        supervisors: employee_choices(&supervisors),
        divisions: divisions
            .iter()
            .filter_map(DivisionInfo::from_division)
            .collect(),
        security_clearances: SecurityClearance::ALL
            .into_iter()
            .map(ClearanceChoice::from)
            .collect(),
    })
}

/// Keeps a post-login destination only if it stays on this site.
fn local_redirect(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => String::from("/"),
    }
}

fn load_account(
    persistence: &mut SqlitePersistence,
    user_id: i64,
) -> Result<UserAccountData, ApiError> {
    persistence
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: format!("Account {user_id} does not exist"),
        })
}

fn user_info(
    persistence: &mut SqlitePersistence,
    account: &UserAccountData,
) -> Result<UserInfo, ApiError> {
    let groups: BTreeSet<Group> = persistence.get_user_groups(account.user_id)?;
    let permissions: Vec<Permission> = persistence.get_user_permissions(account.user_id)?;
    Ok(UserInfo {
        user_id: account.user_id,
        username: account.username.clone(),
        first_name: account.first_name.clone(),
        last_name: account.last_name.clone(),
        email: account.email.clone(),
        is_superuser: account.is_superuser,
        is_active: account.is_active,
        groups: groups.into_iter().collect(),
        permissions,
    })
}

fn employee_info(cipher: &FieldCipher, employee: &Employee) -> Result<EmployeeInfo, ApiError> {
    let employee_id: i64 = employee.employee_id.ok_or_else(|| ApiError::Internal {
        message: String::from("Employee has no identifier"),
    })?;

    let social_security_number: Option<String> = employee
        .sealed_social_security_number
        .as_deref()
        .map(|sealed| cipher.masked_ssn(sealed))
        .transpose()?;

    Ok(EmployeeInfo {
        employee_id,
        user_id: employee.user_id,
        username: employee.account.username.clone(),
        display_name: employee.display_name(),
        division_id: employee.division_id,
        address: employee.address.clone(),
        phone_number: employee.phone_number.clone(),
        social_security_number,
        security_clearance: employee.security_clearance.level(),
    })
}

fn audit_event_info(stored: StoredAuditEvent) -> Result<AuditEventInfo, ApiError> {
    let event: AuditEvent = stored.event;
    let event_id: i64 = event.event_id.ok_or_else(|| ApiError::Internal {
        message: String::from("Stored audit event has no identifier"),
    })?;

    Ok(AuditEventInfo {
        event_id,
        actor_user_id: event.actor.user_id,
        actor_username: event.actor.username,
        cause_id: event.cause.id,
        cause_description: event.cause.description,
        action_name: event.action.name,
        action_details: event.action.details,
        target_kind: event.target.map(|t| t.kind.as_str().to_string()),
        target_id: event.target.map(|t| t.id),
        before: event.before.data,
        after: event.after.data,
        created_at: stored.created_at,
    })
}

// ============================================================================
// Authentication
// ============================================================================

/// Logs in and creates a session.
///
/// # Errors
///
/// Returns `ApiError::AuthenticationFailed` for unknown accounts, inactive
/// accounts and wrong passwords alike.
pub fn login(
    persistence: &mut SqlitePersistence,
    request: &LoginRequest,
    cause: Cause,
) -> Result<LoginResponse, ApiError> {
    let (session_token, session, principal): (String, SessionData, Principal) =
        AuthenticationService::login(persistence, &request.username, &request.password, cause)?;

    Ok(LoginResponse {
        session_token,
        username: principal.username,
        expires_at: session.expires_at,
        redirect_to: local_redirect(request.next.as_deref()),
    })
}

/// Describes the login form.
///
/// `next` is echoed back when it is a local path and falls back to `/`
/// otherwise, so the form cannot send anyone off-site.
#[must_use]
pub fn login_form(next: Option<&str>) -> LoginFormResponse {
    LoginFormResponse {
        fields: LOGIN_FORM_FIELDS.iter().map(ToString::to_string).collect(),
        next: local_redirect(next),
    }
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(
    persistence: &mut SqlitePersistence,
    session_token: &str,
    principal: &Principal,
    cause: Cause,
) -> Result<LogoutResponse, ApiError> {
    AuthenticationService::logout(persistence, session_token, principal, cause)?;
    Ok(LogoutResponse {
        message: String::from("Logged out"),
    })
}

/// Reports whether the system has no accounts yet.
///
/// # Errors
///
/// Returns an error if the count fails.
pub fn check_bootstrap_status(
    persistence: &mut SqlitePersistence,
) -> Result<BootstrapStatusResponse, ApiError> {
    let user_count: i64 = persistence.count_users()?;
    Ok(BootstrapStatusResponse {
        is_bootstrap_mode: user_count == 0,
    })
}

/// Creates the first superuser.
///
/// Only succeeds while no account exists.
///
/// # Errors
///
/// Returns an error if:
/// - An account already exists
/// - The password violates the policy
/// - Database operations fail
pub fn bootstrap_superuser(
    persistence: &mut SqlitePersistence,
    request: &BootstrapSuperuserRequest,
    cause: Cause,
) -> Result<BootstrapSuperuserResponse, ApiError> {
    if persistence.count_users()? > 0 {
        return Err(ApiError::Unauthorized {
            action: String::from("bootstrap_superuser"),
            required_permission: String::from("Bootstrap mode (no accounts exist)"),
        });
    }

    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &request.username,
        &request.email,
    )?;

    let username: String = request.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("username"),
            message: String::from("Username cannot be empty"),
        });
    }

    let account: NewUserAccount = NewUserAccount {
        username: username.clone(),
        password: request.password.clone(),
        email: request.email.clone(),
        is_superuser: true,
        ..NewUserAccount::default()
    };

    let event: AuditEvent = AuditEvent::new(
        Actor::system(),
        cause,
        Action::new(
            String::from("BootstrapSuperuser"),
            Some(format!("Created superuser {username}")),
        ),
        None,
        StateSnapshot::absent(),
        snapshot(&serde_json::json!({ "username": username, "is_superuser": true }))?,
    );

    let user_id: i64 = persistence.create_user(&account, &event)?;
    info!(user_id, username = %username, "Bootstrap superuser created");

    Ok(BootstrapSuperuserResponse {
        user_id,
        username,
        message: String::from("Superuser created successfully"),
    })
}

// ============================================================================
// Index
// ============================================================================

/// Builds the index page for a principal.
///
/// Lists the principal is not entitled to are omitted:
/// - NASA administrators see the reports assigned to them.
/// - ISS administrators see the missions they supervise and those
///   missions' reports, replacing the NASA list.
/// - Superusers see everything.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn index(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
) -> Result<IndexResponse, ApiError> {
    let scope: IndexScope = resolve_index_scope(
        principal.is_superuser,
        principal.employee_id(),
        &principal.groups,
    );

    let missions: Option<Vec<MissionInfo>> = match scope.missions {
        Some(mission_scope) => Some(mission_infos(&persistence.list_missions(mission_scope)?)?),
        None => None,
    };
    let mission_reports: Option<Vec<MissionReportInfo>> = match scope.mission_reports {
        Some(report_scope) => Some(report_infos(&persistence.list_reports(report_scope)?)?),
        None => None,
    };

    Ok(IndexResponse {
        can_add_mission: can_add_mission(principal),
        missions,
        mission_reports,
    })
}

// ============================================================================
// Missions
// ============================================================================

/// Returns a mission with its reports and the actions available on it.
///
/// Requires `missions.view_mission`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown mission.
pub fn mission_details(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    mission_id: i64,
) -> Result<MissionDetailsResponse, ApiError> {
    AuthorizationService::require(principal, Permission::ViewMission, "mission_details")?;

    let mission: Mission = load_mission(persistence, mission_id)?;
    let reports: Vec<MissionReport> = persistence.list_reports_for_mission(mission_id)?;
    let assignees: Vec<Employee> = persistence.list_employees_in_group(Group::NasaAdmin)?;

    Ok(MissionDetailsResponse {
        mission: MissionInfo::from_mission(&mission)?,
        reports: report_infos(&reports)?,
        capabilities: compute_mission_capabilities(principal),
        report_assignees: employee_choices(&assignees),
    })
}

/// Returns an empty mission form with its choices.
///
/// Requires `missions.add_mission`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission.
pub fn mission_create_form(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
) -> Result<MissionFormResponse, ApiError> {
    AuthorizationService::require(principal, Permission::AddMission, "mission_create")?;

    Ok(MissionFormResponse {
        mission: None,
        choices: mission_form_choices(persistence)?,
    })
}

/// Creates a mission from a submitted form.
///
/// Requires `missions.add_mission`. Nothing is stored if any field is
/// invalid.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::InvalidForm` listing every invalid field.
pub fn mission_create(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    form: &MissionForm,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::AddMission, "mission_create")?;

    let mission: Mission = clean_mission_form(persistence, form, None)?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "CreateMission",
        format!("Created mission '{}'", mission.name),
        None,
        StateSnapshot::absent(),
        snapshot(&mission)?,
    );
    let mission_id: i64 = persistence.create_mission(&mission, &event)?;

    info!(mission_id, username = %principal.username, "Mission created");

    Ok(CreatedResponse {
        id: mission_id,
        location: format!("/mission/{mission_id}"),
        message: format!("Mission '{}' created", mission.name),
    })
}

/// Returns the form for an existing mission with its choices.
///
/// Requires `missions.change_mission`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown mission.
pub fn mission_update_form(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    mission_id: i64,
) -> Result<MissionFormResponse, ApiError> {
    AuthorizationService::require(principal, Permission::ChangeMission, "mission_update")?;

    let mission: Mission = load_mission(persistence, mission_id)?;

    Ok(MissionFormResponse {
        mission: Some(MissionInfo::from_mission(&mission)?),
        choices: mission_form_choices(persistence)?,
    })
}

/// Replaces a mission with a submitted form.
///
/// Requires `missions.change_mission`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission,
/// `ApiError::ResourceNotFound` for an unknown mission and
/// `ApiError::InvalidForm` listing every invalid field.
pub fn mission_update(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    mission_id: i64,
    form: &MissionForm,
    cause: Cause,
) -> Result<UpdatedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::ChangeMission, "mission_update")?;

    let before: Mission = load_mission(persistence, mission_id)?;
    let after: Mission = clean_mission_form(persistence, form, Some(mission_id))?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "UpdateMission",
        format!("Updated mission '{}'", after.name),
        Some(AuditTarget::mission(mission_id)),
        snapshot(&before)?,
        snapshot(&after)?,
    );
    persistence.update_mission(mission_id, &after, &event)?;

    info!(mission_id, username = %principal.username, "Mission updated");

    Ok(UpdatedResponse {
        id: mission_id,
        location: format!("/mission/{mission_id}"),
        message: format!("Mission '{}' updated", after.name),
    })
}

/// Deletes a mission and, through the cascade, its reports.
///
/// Requires `missions.delete_mission`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown mission.
pub fn mission_delete(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    mission_id: i64,
    cause: Cause,
) -> Result<DeletedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::DeleteMission, "mission_delete")?;

    let mission: Mission = load_mission(persistence, mission_id)?;
    let report_count: i64 = persistence.count_reports_for_mission(mission_id)?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "DeleteMission",
        format!(
            "Deleted mission '{}' with {report_count} report(s)",
            mission.name
        ),
        Some(AuditTarget::mission(mission_id)),
        snapshot(&mission)?,
        StateSnapshot::absent(),
    );
    persistence.delete_mission(mission_id, &event)?;

    info!(mission_id, report_count, username = %principal.username, "Mission deleted");

    Ok(DeletedResponse {
        redirect_to: String::from("/"),
        message: format!("Mission '{}' deleted", mission.name),
    })
}

/// Checks that the principal may delete missions, without deleting.
///
/// Used for requests that reach the delete route with a method that does
/// not change state.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without `missions.delete_mission`.
pub fn authorize_mission_delete(principal: &Principal) -> Result<(), ApiError> {
    AuthorizationService::require(principal, Permission::DeleteMission, "mission_delete")?;
    Ok(())
}

// ============================================================================
// Mission reports
// ============================================================================

/// Generates the next report for a mission.
///
/// Requires `missions.add_missionreport`. The title numbers reports from 1
/// in generation order and the publish date is the current time.
///
/// # Errors
///
/// Returns an error if:
/// - The principal lacks the permission
/// - The mission does not exist
/// - The form is invalid
/// - The assignee is not a NASA administrator
pub fn mission_report_generate(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    mission_id: i64,
    form: &GenerateReportForm,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    AuthorizationService::require(
        principal,
        Permission::AddMissionReport,
        "mission_report_generate",
    )?;

    let mission: Mission = load_mission(persistence, mission_id)?;
    let cleaned: CleanedReportForm = clean_report_form(persistence, form)?;

    let existing: usize = persistence
        .count_reports_for_mission(mission_id)?
        .to_usize()
        .unwrap_or_default();

    let report: MissionReport = MissionReport {
        report_id: None,
        title: next_report_title(&mission.name, existing),
        mission_id,
        assigned_to: Some(cleaned.assigned_to),
        publish_date: OffsetDateTime::now_utc(),
        summary: cleaned.summary,
    };
    validate_report_fields(&report)?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "GenerateReport",
        format!("Generated '{}' for mission {mission_id}", report.title),
        None,
        StateSnapshot::absent(),
        snapshot(&report)?,
    );
    let report_id: i64 = persistence.create_report(&report, &event)?;

    info!(
        report_id,
        mission_id,
        assigned_to = cleaned.assigned_to,
        "Mission report generated"
    );

    Ok(CreatedResponse {
        id: report_id,
        location: format!("/mission-report/{report_id}"),
        message: format!("'{}' generated", report.title),
    })
}

/// Checks that the principal may generate reports, without generating one.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without `missions.add_missionreport`.
pub fn authorize_report_generate(principal: &Principal) -> Result<(), ApiError> {
    AuthorizationService::require(
        principal,
        Permission::AddMissionReport,
        "mission_report_generate",
    )?;
    Ok(())
}

/// Returns a mission report.
///
/// Requires `missions.view_missionreport`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown report.
pub fn mission_report_details(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    report_id: i64,
) -> Result<MissionReportDetailsResponse, ApiError> {
    AuthorizationService::require(
        principal,
        Permission::ViewMissionReport,
        "mission_report_details",
    )?;

    let report: MissionReport = load_report(persistence, report_id)?;
    let mission: Mission = load_mission(persistence, report.mission_id)?;
    let assignee: Option<EmployeeChoice> = match report.assigned_to {
        Some(employee_id) => persistence
            .get_employee(employee_id)?
            .as_ref()
            .and_then(employee_choice),
        None => None,
    };

    Ok(MissionReportDetailsResponse {
        report: MissionReportInfo::from_report(&report)?,
        mission_name: mission.name,
        assignee,
    })
}

/// Deletes a mission report.
///
/// Requires `missions.delete_missionreport`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown report.
pub fn mission_report_delete(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    report_id: i64,
    cause: Cause,
) -> Result<DeletedResponse, ApiError> {
    AuthorizationService::require(
        principal,
        Permission::DeleteMissionReport,
        "mission_report_delete",
    )?;

    let report: MissionReport = load_report(persistence, report_id)?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "DeleteReport",
        format!("Deleted '{}'", report.title),
        Some(AuditTarget::mission_report(report_id)),
        snapshot(&report)?,
        StateSnapshot::absent(),
    );
    persistence.delete_report(report_id, &event)?;

    info!(report_id, username = %principal.username, "Mission report deleted");

    Ok(DeletedResponse {
        redirect_to: format!("/mission/{}", report.mission_id),
        message: format!("'{}' deleted", report.title),
    })
}

// ============================================================================
// Directory
// ============================================================================

/// Lists all accounts. Superuser only.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for other principals.
pub fn list_users(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
) -> Result<ListUsersResponse, ApiError> {
    AuthorizationService::require_superuser(principal, "list_users")?;

    let accounts: Vec<UserAccountData> = persistence.list_users()?;
    let users: Vec<UserInfo> = accounts
        .iter()
        .map(|account| user_info(persistence, account))
        .collect::<Result<_, _>>()?;

    Ok(ListUsersResponse { users })
}

/// Creates an account. Superuser only.
///
/// The account and its requested group memberships are written together
/// under a single audit event.
///
/// # Errors
///
/// Returns an error if:
/// - The principal is not a superuser
/// - The password violates the policy
/// - The username is taken
pub fn create_user(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    request: &CreateUserRequest,
    cause: Cause,
) -> Result<UserInfo, ApiError> {
    AuthorizationService::require_superuser(principal, "create_user")?;

    let username: String = request.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("username"),
            message: String::from("Username cannot be empty"),
        });
    }

    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &username,
        &request.email,
    )?;

    let account: NewUserAccount = NewUserAccount {
        username: username.clone(),
        password: request.password.clone(),
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        email: request.email.trim().to_string(),
        is_superuser: request.is_superuser,
        groups: request.groups.clone(),
    };

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "CreateUser",
        format!("Created account {username}"),
        None,
        StateSnapshot::absent(),
        snapshot(&serde_json::json!({
            "username": account.username,
            "first_name": account.first_name,
            "last_name": account.last_name,
            "email": account.email,
            "is_superuser": account.is_superuser,
            "groups": account.groups,
        }))?,
    );
    let user_id: i64 = persistence.create_user(&account, &event)?;

    info!(user_id, username = %username, "Account created");

    let created: UserAccountData =
        persistence
            .get_user_by_id(user_id)?
            .ok_or_else(|| ApiError::Internal {
                message: String::from("Account not found after creation"),
            })?;
    user_info(persistence, &created)
}

/// Adds an account to a group. Superuser only.
///
/// Adding an existing member again succeeds without change.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for other principals and
/// `ApiError::ResourceNotFound` for an unknown account.
pub fn add_user_to_group(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    user_id: i64,
    request: &AddToGroupRequest,
    cause: Cause,
) -> Result<UserInfo, ApiError> {
    AuthorizationService::require_superuser(principal, "add_user_to_group")?;

    let account: UserAccountData = load_account(persistence, user_id)?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "AddUserToGroup",
        format!("Added {} to {}", account.username, request.group),
        Some(AuditTarget::new(TargetKind::Account, user_id)),
        StateSnapshot::absent(),
        StateSnapshot::new(request.group.as_str().to_string()),
    );
    persistence.add_user_to_group(user_id, request.group, &event)?;

    info!(user_id, group = %request.group, "Account added to group");

    user_info(persistence, &account)
}

/// Grants a permission directly to an account. Superuser only.
///
/// Granting a permission the account already holds directly succeeds
/// without change.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for other principals and
/// `ApiError::ResourceNotFound` for an unknown account.
pub fn grant_user_permission(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    user_id: i64,
    request: &GrantPermissionRequest,
    cause: Cause,
) -> Result<UserInfo, ApiError> {
    AuthorizationService::require_superuser(principal, "grant_user_permission")?;

    let account: UserAccountData = load_account(persistence, user_id)?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "GrantPermission",
        format!("Granted {} to {}", request.permission, account.username),
        Some(AuditTarget::new(TargetKind::Account, user_id)),
        StateSnapshot::absent(),
        StateSnapshot::new(request.permission.qualified_name()),
    );
    persistence.grant_user_permission(user_id, request.permission, &event)?;

    info!(user_id, permission = %request.permission, "Permission granted");

    user_info(persistence, &account)
}

/// Activates or deactivates an account. Superuser only.
///
/// Deactivation ends every session of the account. A superuser cannot
/// deactivate their own account.
///
/// # Errors
///
/// Returns an error if:
/// - The principal is not a superuser
/// - The account does not exist
/// - The principal tries to deactivate themselves
pub fn set_user_active(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    user_id: i64,
    request: &SetActiveRequest,
    cause: Cause,
) -> Result<UserInfo, ApiError> {
    AuthorizationService::require_superuser(principal, "set_user_active")?;

    let account: UserAccountData = load_account(persistence, user_id)?;
    if !request.is_active && account.user_id == principal.user_id {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("cannot_deactivate_self"),
            message: String::from("You cannot deactivate your own account"),
        });
    }

    let (action, verb): (&str, &str) = if request.is_active {
        ("ActivateUser", "Activated")
    } else {
        ("DeactivateUser", "Deactivated")
    };
    let event: AuditEvent = audit_event(
        principal,
        cause,
        action,
        format!("{verb} account {}", account.username),
        Some(AuditTarget::new(TargetKind::Account, user_id)),
        snapshot(&serde_json::json!({ "is_active": account.is_active }))?,
        snapshot(&serde_json::json!({ "is_active": request.is_active }))?,
    );
    persistence.set_user_active(user_id, request.is_active, &event)?;

    info!(user_id, is_active = request.is_active, "Account activity changed");

    let updated: UserAccountData = load_account(persistence, user_id)?;
    user_info(persistence, &updated)
}

/// Lists divisions.
///
/// Requires `missions.view_division`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission.
pub fn list_divisions(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
) -> Result<ListDivisionsResponse, ApiError> {
    AuthorizationService::require(principal, Permission::ViewDivision, "list_divisions")?;

    let divisions: Vec<Division> = persistence.list_divisions()?;
    Ok(ListDivisionsResponse {
        divisions: divisions
            .iter()
            .filter_map(DivisionInfo::from_division)
            .collect(),
    })
}

/// Creates a division.
///
/// Requires `missions.add_division`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::InvalidInput` for an empty or overlong name.
pub fn create_division(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    request: &CreateDivisionRequest,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::AddDivision, "create_division")?;

    validate_division_name(&request.name)?;
    let division: Division = Division::new(&request.name);

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "CreateDivision",
        format!("Created division '{}'", division.name()),
        None,
        StateSnapshot::absent(),
        snapshot(&division)?,
    );
    let division_id: i64 = persistence.create_division(&division, &event)?;

    info!(division_id, name = %division.name(), "Division created");

    Ok(CreatedResponse {
        id: division_id,
        location: String::from("/directory/divisions"),
        message: format!("Division '{}' created", division.name()),
    })
}

/// Deletes a division.
///
/// Requires `missions.delete_division`. Employees and missions of the
/// division keep existing without one.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown division.
pub fn delete_division(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    division_id: i64,
    cause: Cause,
) -> Result<DeletedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::DeleteDivision, "delete_division")?;

    let division: Division =
        persistence
            .get_division(division_id)?
            .ok_or_else(|| ApiError::ResourceNotFound {
                resource_type: String::from("Division"),
                message: format!("Division {division_id} does not exist"),
            })?;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "DeleteDivision",
        format!("Deleted division '{}'", division.name()),
        Some(AuditTarget::new(TargetKind::Division, division_id)),
        snapshot(&division)?,
        StateSnapshot::absent(),
    );
    persistence.delete_division(division_id, &event)?;

    info!(division_id, name = %division.name(), "Division deleted");

    Ok(DeletedResponse {
        redirect_to: String::from("/directory/divisions"),
        message: format!("Division '{}' deleted", division.name()),
    })
}

/// Lists employee profiles with masked social security numbers.
///
/// Requires `missions.view_employee`.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission, or an internal
/// error if a stored number cannot be opened.
pub fn list_employees(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    cipher: &FieldCipher,
) -> Result<ListEmployeesResponse, ApiError> {
    AuthorizationService::require(principal, Permission::ViewEmployee, "list_employees")?;

    let employees: Vec<Employee> = persistence.list_employees()?;
    Ok(ListEmployeesResponse {
        employees: employees
            .iter()
            .map(|employee| employee_info(cipher, employee))
            .collect::<Result<_, _>>()?,
    })
}

/// Creates the employee profile of an account.
///
/// Requires `missions.add_employee`. The social security number is sealed
/// before it is stored and left out of the audit snapshot.
///
/// # Errors
///
/// Returns an error if:
/// - The principal lacks the permission
/// - The form is invalid
/// - The account already has a profile
pub fn create_employee(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    cipher: &FieldCipher,
    form: &EmployeeForm,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::AddEmployee, "create_employee")?;

    let employee: Employee = clean_employee_form(persistence, cipher, form)?;

    let mut audited: Employee = employee.clone();
    audited.sealed_social_security_number = None;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "CreateEmployee",
        format!("Created employee profile for {}", employee.account.username),
        None,
        StateSnapshot::absent(),
        snapshot(&audited)?,
    );
    let employee_id: i64 = persistence.create_employee(&employee, &event)?;

    info!(employee_id, user_id = employee.user_id, "Employee profile created");

    Ok(CreatedResponse {
        id: employee_id,
        location: String::from("/directory/employees"),
        message: format!("Employee profile for {} created", employee.display_name()),
    })
}

/// Deletes an employee profile.
///
/// Requires `missions.delete_employee`. Missions the employee supervised
/// are deleted with it and reports assigned to them lose their assignee.
/// The account itself is kept.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` without the permission and
/// `ApiError::ResourceNotFound` for an unknown employee.
pub fn delete_employee(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    employee_id: i64,
    cause: Cause,
) -> Result<DeletedResponse, ApiError> {
    AuthorizationService::require(principal, Permission::DeleteEmployee, "delete_employee")?;

    let mut employee: Employee =
        persistence
            .get_employee(employee_id)?
            .ok_or_else(|| ApiError::ResourceNotFound {
                resource_type: String::from("Employee"),
                message: format!("Employee {employee_id} does not exist"),
            })?;
    employee.sealed_social_security_number = None;

    let event: AuditEvent = audit_event(
        principal,
        cause,
        "DeleteEmployee",
        format!("Deleted employee profile of {}", employee.account.username),
        Some(AuditTarget::new(TargetKind::Employee, employee_id)),
        snapshot(&employee)?,
        StateSnapshot::absent(),
    );
    persistence.delete_employee(employee_id, &event)?;

    info!(employee_id, user_id = employee.user_id, "Employee profile deleted");

    Ok(DeletedResponse {
        redirect_to: String::from("/directory/employees"),
        message: format!("Employee profile of {} deleted", employee.display_name()),
    })
}

// ============================================================================
// Audit
// ============================================================================

/// Lists the most recent audit events, newest first. Superuser only.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for other principals and
/// `ApiError::InvalidInput` for a non-positive limit.
pub fn list_audit_events(
    persistence: &mut SqlitePersistence,
    principal: &Principal,
    limit: Option<i64>,
) -> Result<ListAuditEventsResponse, ApiError> {
    AuthorizationService::require_superuser(principal, "list_audit_events")?;

    let limit: i64 = limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
    if limit <= 0 {
        return Err(ApiError::InvalidInput {
            field: String::from("limit"),
            message: format!("Limit must be positive, got {limit}"),
        });
    }

    let events: Vec<AuditEventInfo> = persistence
        .list_recent_audit_events(limit)?
        .into_iter()
        .map(audit_event_info)
        .collect::<Result<_, _>>()?;

    Ok(ListAuditEventsResponse { events })
}
