// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use missions_domain::{Division, Group, Mission, MissionReport, Permission, SecurityClearance};
use serde::{Deserialize, Serialize};

use crate::capabilities::MissionCapabilities;

// ============================================================================
// Authentication
// ============================================================================

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The account username.
    pub username: String,
    /// The account password.
    pub password: String,
    /// Where to go after logging in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// API response describing the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFormResponse {
    /// Names of the fields the form submits.
    pub fields: Vec<String>,
    /// Where a successful login leads.
    pub next: String,
}

/// API response for successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The session token (opaque).
    pub session_token: String,
    /// The account username.
    pub username: String,
    /// Session expiration timestamp (RFC 3339).
    pub expires_at: String,
    /// Where the client should go next.
    pub redirect_to: String,
}

/// API response for logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// A confirmation message.
    pub message: String,
}

/// API response for bootstrap status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapStatusResponse {
    /// True while no account exists.
    pub is_bootstrap_mode: bool,
}

/// API request to create the first superuser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapSuperuserRequest {
    /// The superuser username.
    pub username: String,
    /// The superuser password.
    pub password: String,
    /// The password confirmation.
    pub password_confirmation: String,
    /// The superuser email.
    #[serde(default)]
    pub email: String,
}

/// API response after creating the first superuser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapSuperuserResponse {
    /// The new account identifier.
    pub user_id: i64,
    /// The new account username.
    pub username: String,
    /// A success message.
    pub message: String,
}

// ============================================================================
// Missions and reports
// ============================================================================

/// Mission as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionInfo {
    /// The mission identifier.
    pub mission_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub division_id: Option<i64>,
    pub supervisor_id: i64,
    /// Date of commencement (RFC 3339).
    pub start_date: Option<String>,
    /// Date of completion (RFC 3339).
    pub end_date: Option<String>,
    /// Clearance level (1-4).
    pub security_clearance: i32,
    /// Clearance label, e.g. "Top Secret".
    pub security_clearance_label: String,
}

/// Mission report as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionReportInfo {
    /// The report identifier.
    pub report_id: i64,
    pub title: String,
    pub mission_id: i64,
    pub assigned_to: Option<i64>,
    /// Publish timestamp (RFC 3339).
    pub publish_date: String,
    pub summary: String,
}

/// An employee offered as a form choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeChoice {
    pub employee_id: i64,
    pub display_name: String,
}

/// A security clearance offered as a form choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceChoice {
    pub level: i32,
    pub label: String,
}

impl From<SecurityClearance> for ClearanceChoice {
    fn from(clearance: SecurityClearance) -> Self {
        Self {
            level: clearance.level(),
            label: clearance.label().to_string(),
        }
    }
}

/// Division as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionInfo {
    pub division_id: i64,
    pub name: String,
}

impl DivisionInfo {
    /// Builds the response form of a persisted division.
    #[must_use]
    pub fn from_division(division: &Division) -> Option<Self> {
        division.division_id().map(|division_id| Self {
            division_id,
            name: division.name().to_string(),
        })
    }
}

/// Choices offered by the mission create/update form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionFormChoices {
    /// Employees eligible to supervise.
    pub supervisors: Vec<EmployeeChoice>,
    pub divisions: Vec<DivisionInfo>,
    pub security_clearances: Vec<ClearanceChoice>,
}

/// Submitted mission create/update form.
///
/// Fields arrive as entered; cleaning turns them into a `Mission`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Division identifier.
    #[serde(default)]
    pub division: Option<i64>,
    /// Supervising employee identifier.
    #[serde(default)]
    pub supervisor: Option<i64>,
    /// RFC 3339 date-time; blank means none.
    #[serde(default)]
    pub start_date: Option<String>,
    /// RFC 3339 date-time; blank means none.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Clearance level (1-4).
    #[serde(default)]
    pub security_clearance: Option<i64>,
}

/// Submitted report generation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateReportForm {
    /// Employee the report is assigned to.
    #[serde(default)]
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub report_summary: String,
}

/// API response for the index page.
///
/// Lists the principal may not see are omitted entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub can_add_mission: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missions: Option<Vec<MissionInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_reports: Option<Vec<MissionReportInfo>>,
}

/// API response for mission details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionDetailsResponse {
    pub mission: MissionInfo,
    pub reports: Vec<MissionReportInfo>,
    #[serde(flatten)]
    pub capabilities: MissionCapabilities,
    /// Employees a generated report may be assigned to.
    pub report_assignees: Vec<EmployeeChoice>,
}

/// API response for the mission create/update form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionFormResponse {
    /// The mission being edited; absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<MissionInfo>,
    pub choices: MissionFormChoices,
}

/// API response for mission report details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionReportDetailsResponse {
    pub report: MissionReportInfo,
    pub mission_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<EmployeeChoice>,
}

/// API response for a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// The new record identifier.
    pub id: i64,
    /// Where the new record can be viewed.
    pub location: String,
    /// A success message.
    pub message: String,
}

/// API response for a successful update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub id: i64,
    pub location: String,
    pub message: String,
}

/// API response for a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    /// Where the client should go next.
    pub redirect_to: String,
    pub message: String,
}

// ============================================================================
// Directory
// ============================================================================

/// API request to create an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_superuser: bool,
    /// Groups to join immediately.
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Account as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub groups: Vec<Group>,
    /// Permissions granted directly, not through a group.
    pub permissions: Vec<Permission>,
}

/// API response for listing accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserInfo>,
}

/// API request to add an account to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToGroupRequest {
    pub group: Group,
}

/// API request to grant a permission directly to an account.
///
/// Accepts `missions.view_division` as well as the bare `view_division`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantPermissionRequest {
    pub permission: Permission,
}

/// API request to activate or deactivate an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// API request to create a division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDivisionRequest {
    pub name: String,
}

/// API response for listing divisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDivisionsResponse {
    pub divisions: Vec<DivisionInfo>,
}

/// Submitted employee profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeForm {
    /// The account the profile belongs to.
    pub user_id: i64,
    #[serde(default)]
    pub division: Option<i64>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    /// Nine digits, hyphens allowed; blank means none.
    #[serde(default)]
    pub social_security_number: String,
    #[serde(default)]
    pub security_clearance: Option<i64>,
}

/// Employee profile as returned to clients.
///
/// The social security number is only ever shown masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInfo {
    pub employee_id: i64,
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub division_id: Option<i64>,
    pub address: String,
    pub phone_number: String,
    /// Masked as `***-**-NNNN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_security_number: Option<String>,
    pub security_clearance: i32,
}

/// API response for listing employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEmployeesResponse {
    pub employees: Vec<EmployeeInfo>,
}

// ============================================================================
// Audit
// ============================================================================

/// Audit event as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventInfo {
    pub event_id: i64,
    pub actor_user_id: Option<i64>,
    pub actor_username: String,
    pub cause_id: String,
    pub cause_description: String,
    pub action_name: String,
    pub action_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,
    pub before: String,
    pub after: String,
    pub created_at: String,
}

/// API response for listing audit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAuditEventsResponse {
    pub events: Vec<AuditEventInfo>,
}

// ============================================================================
// Conversions
// ============================================================================

/// Formats an optional date-time for a response.
fn format_optional(
    value: Option<time::OffsetDateTime>,
) -> Result<Option<String>, missions_domain::DomainError> {
    value.map(missions_domain::format_datetime).transpose()
}

impl MissionInfo {
    /// Builds the response form of a persisted mission.
    ///
    /// # Errors
    ///
    /// Returns an error if the mission has no identifier or a date cannot
    /// be formatted.
    pub fn from_mission(mission: &Mission) -> Result<Self, crate::ApiError> {
        let mission_id: i64 = mission.mission_id.ok_or_else(|| crate::ApiError::Internal {
            message: String::from("Mission has no identifier"),
        })?;

        Ok(Self {
            mission_id,
            name: mission.name.clone(),
            description: mission.description.clone(),
            division_id: mission.division_id,
            supervisor_id: mission.supervisor_id,
            start_date: format_optional(mission.start_date)?,
            end_date: format_optional(mission.end_date)?,
            security_clearance: mission.security_clearance.level(),
            security_clearance_label: mission.security_clearance.label().to_string(),
        })
    }
}

impl MissionReportInfo {
    /// Builds the response form of a persisted report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report has no identifier or its publish date
    /// cannot be formatted.
    pub fn from_report(report: &MissionReport) -> Result<Self, crate::ApiError> {
        let report_id: i64 = report.report_id.ok_or_else(|| crate::ApiError::Internal {
            message: String::from("Mission report has no identifier"),
        })?;

        Ok(Self {
            report_id,
            title: report.title.clone(),
            mission_id: report.mission_id,
            assigned_to: report.assigned_to,
            publish_date: missions_domain::format_datetime(report.publish_date)?,
            summary: report.summary.clone(),
        })
    }
}
