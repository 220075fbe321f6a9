// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Mission name is empty or too long.
    InvalidName(String),
    /// Mission description is too long.
    InvalidDescription(String),
    /// Division name is empty or too long.
    InvalidDivisionName(String),
    /// Report title is empty or too long.
    InvalidTitle(String),
    /// Report summary is empty or too long.
    InvalidSummary(String),
    /// Employee address is too long.
    InvalidAddress(String),
    /// Employee phone number is too long.
    InvalidPhoneNumber(String),
    /// Social security number is not exactly nine digits.
    InvalidSocialSecurityNumber(String),
    /// Security clearance value is outside 1..=4.
    InvalidSecurityClearance(i64),
    /// The end date-time precedes the start date-time.
    InvalidDateRange,
    /// Failed to parse a date-time string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// The selected supervisor is not an ISS administrator.
    IneligibleSupervisor {
        /// The employee that was selected.
        employee_id: i64,
    },
    /// The selected report assignee is not a NASA administrator.
    IneligibleAssignee {
        /// The employee that was selected.
        employee_id: i64,
    },
    /// Group name is not one of the known groups.
    UnknownGroup(String),
    /// Permission codename is not recognized.
    UnknownPermission(String),
    /// Mission does not exist.
    MissionNotFound(i64),
    /// Mission report does not exist.
    MissionReportNotFound(i64),
    /// Employee does not exist.
    EmployeeNotFound(i64),
    /// Division does not exist.
    DivisionNotFound(i64),
    /// The account already has an employee profile.
    DuplicateEmployeeProfile {
        /// The account that already has a profile.
        user_id: i64,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidDescription(msg) => write!(f, "Invalid description: {msg}"),
            Self::InvalidDivisionName(msg) => write!(f, "Invalid division name: {msg}"),
            Self::InvalidTitle(msg) => write!(f, "Invalid title: {msg}"),
            Self::InvalidSummary(msg) => write!(f, "Invalid summary: {msg}"),
            Self::InvalidAddress(msg) => write!(f, "Invalid address: {msg}"),
            Self::InvalidPhoneNumber(msg) => write!(f, "Invalid phone number: {msg}"),
            Self::InvalidSocialSecurityNumber(msg) => {
                write!(f, "Invalid social security number: {msg}")
            }
            Self::InvalidSecurityClearance(value) => {
                write!(
                    f,
                    "Invalid security clearance: {value}. Must be between 1 and 4"
                )
            }
            Self::InvalidDateRange => {
                write!(f, "End date-time must be later than start date-time.")
            }
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::IneligibleSupervisor { employee_id } => {
                write!(
                    f,
                    "Employee {employee_id} cannot supervise missions: not an ISS administrator"
                )
            }
            Self::IneligibleAssignee { employee_id } => {
                write!(
                    f,
                    "Employee {employee_id} cannot be assigned reports: not a NASA administrator"
                )
            }
            Self::UnknownGroup(name) => write!(f, "Unknown group: {name}"),
            Self::UnknownPermission(name) => write!(f, "Unknown permission: {name}"),
            Self::MissionNotFound(id) => write!(f, "Mission {id} not found"),
            Self::MissionReportNotFound(id) => write!(f, "Mission report {id} not found"),
            Self::EmployeeNotFound(id) => write!(f, "Employee {id} not found"),
            Self::DivisionNotFound(id) => write!(f, "Division {id} not found"),
            Self::DuplicateEmployeeProfile { user_id } => {
                write!(f, "User {user_id} already has an employee profile")
            }
        }
    }
}

impl std::error::Error for DomainError {}
