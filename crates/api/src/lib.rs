// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary layer for the Mission Tracker.
//!
//! Handlers here are transport-agnostic: they take a resolved
//! [`Principal`], enforce permissions, clean submitted forms, and drive the
//! persistence layer. The HTTP server maps their results onto responses.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod auth;
mod capabilities;
mod error;
mod field_encryption;
mod forms;
mod handlers;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticationService, AuthorizationService, Principal};
pub use capabilities::{MissionCapabilities, can_add_mission, compute_mission_capabilities};
pub use error::{
    ApiError, AuthError, domain_error_field, translate_domain_error, translate_persistence_error,
};
pub use field_encryption::{FieldCipher, FieldEncryptionError, dev_field_key, parse_field_key};
pub use forms::{
    CleanedReportForm, FieldErrors, NON_FIELD_ERRORS, clean_employee_form, clean_mission_form,
    clean_report_form,
};
pub use handlers::{
    DEFAULT_AUDIT_LIMIT, add_user_to_group, authorize_mission_delete, authorize_report_generate,
    bootstrap_superuser, check_bootstrap_status, create_division, create_employee, create_user,
    delete_division, delete_employee, grant_user_permission, index, list_audit_events,
    list_divisions, list_employees, list_users, login, login_form, logout, mission_create,
    mission_create_form, mission_delete, mission_details, mission_report_delete,
    mission_report_details, mission_report_generate, mission_update, mission_update_form,
    set_user_active,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AddToGroupRequest, AuditEventInfo, BootstrapStatusResponse, BootstrapSuperuserRequest,
    BootstrapSuperuserResponse, ClearanceChoice, CreateDivisionRequest, CreateUserRequest,
    CreatedResponse, DeletedResponse, DivisionInfo, EmployeeChoice, EmployeeForm, EmployeeInfo,
    GenerateReportForm, GrantPermissionRequest, IndexResponse, ListAuditEventsResponse,
    ListDivisionsResponse, ListEmployeesResponse, ListUsersResponse, LoginFormResponse,
    LoginRequest, LoginResponse, LogoutResponse, MissionDetailsResponse, MissionForm,
    MissionFormChoices, MissionFormResponse, MissionInfo, MissionReportDetailsResponse,
    MissionReportInfo, SetActiveRequest, UpdatedResponse, UserInfo,
};
