// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use missions_domain::DomainError;
use missions_persistence::PersistenceError;
use tracing::error;

use crate::field_encryption::FieldEncryptionError;
use crate::forms::FieldErrors;
use crate::password_policy::PasswordPolicyError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The permission required for this action.
        required_permission: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_permission,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_permission}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/persistence errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the principal lacks a permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The permission required for this action.
        required_permission: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A submitted form failed validation on one or more fields.
    InvalidForm {
        /// Messages keyed by field name.
        errors: FieldErrors,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_permission,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_permission}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::InvalidForm { errors } => {
                write!(f, "Invalid form: {} field(s) rejected", errors.len())
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_permission,
            } => Self::Unauthorized {
                action,
                required_permission,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

impl From<FieldEncryptionError> for ApiError {
    fn from(err: FieldEncryptionError) -> Self {
        error!(error = %err, "Field encryption failed");
        Self::Internal {
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

/// Returns the form field a domain validation error belongs to, if any.
#[must_use]
pub const fn domain_error_field(err: &DomainError) -> Option<&'static str> {
    match err {
        DomainError::InvalidName(_) | DomainError::InvalidDivisionName(_) => Some("name"),
        DomainError::InvalidDescription(_) => Some("description"),
        DomainError::InvalidTitle(_) => Some("title"),
        DomainError::InvalidSummary(_) => Some("report_summary"),
        DomainError::InvalidAddress(_) => Some("address"),
        DomainError::InvalidPhoneNumber(_) => Some("phone_number"),
        DomainError::InvalidSocialSecurityNumber(_) => Some("social_security_number"),
        DomainError::InvalidSecurityClearance(_) => Some("security_clearance"),
        DomainError::InvalidDateRange => Some("end_date"),
        DomainError::DateParseError { .. } => Some("date"),
        DomainError::IneligibleSupervisor { .. } => Some("supervisor"),
        DomainError::IneligibleAssignee { .. } => Some("assigned_to"),
        DomainError::UnknownGroup(_) => Some("group"),
        DomainError::UnknownPermission(_) => Some("permission"),
        DomainError::MissionNotFound(_)
        | DomainError::MissionReportNotFound(_)
        | DomainError::EmployeeNotFound(_)
        | DomainError::DivisionNotFound(_)
        | DomainError::DuplicateEmployeeProfile { .. } => None,
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::MissionNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Mission"),
            message: format!("Mission {id} does not exist"),
        },
        DomainError::MissionReportNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Mission report"),
            message: format!("Mission report {id} does not exist"),
        },
        DomainError::EmployeeNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Employee"),
            message: format!("Employee {id} does not exist"),
        },
        DomainError::DivisionNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Division"),
            message: format!("Division {id} does not exist"),
        },
        DomainError::IneligibleAssignee { .. } => ApiError::DomainRuleViolation {
            rule: String::from("report_assignee_in_nasa_group"),
            message: err.to_string(),
        },
        DomainError::IneligibleSupervisor { .. } => ApiError::DomainRuleViolation {
            rule: String::from("supervisor_in_iss_group"),
            message: err.to_string(),
        },
        DomainError::DuplicateEmployeeProfile { .. } => ApiError::DomainRuleViolation {
            rule: String::from("one_profile_per_account"),
            message: err.to_string(),
        },
        other => ApiError::InvalidInput {
            field: domain_error_field(&other).unwrap_or("unknown").to_string(),
            message: other.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Constraint violations surface as domain rule violations; everything
/// else is internal and logged.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::UniqueViolation(msg) => ApiError::DomainRuleViolation {
            rule: String::from("unique"),
            message: msg,
        },
        PersistenceError::ForeignKeyViolation(msg) => ApiError::DomainRuleViolation {
            rule: String::from("reference_exists"),
            message: msg,
        },
        PersistenceError::NotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message: msg,
        },
        other => {
            error!(error = %other, "Persistence error");
            ApiError::Internal {
                message: format!("Persistence error: {other}"),
            }
        }
    }
}
