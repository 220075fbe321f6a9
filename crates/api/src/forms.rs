// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Form cleaning.
//!
//! Submitted forms are checked field by field and every problem is
//! collected before anything is rejected, so a client can show all errors
//! at once. Cleaning never writes.

use std::collections::BTreeMap;

use missions_domain::{
    AccountName, DomainError, Employee, Group, Mission, SecurityClearance, SocialSecurityNumber,
    parse_optional_datetime, validate_date_order, validate_employee_fields,
    validate_mission_fields, validate_report_summary,
};
use missions_persistence::{SqlitePersistence, UserAccountData};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ApiError, domain_error_field};
use crate::field_encryption::FieldCipher;
use crate::request_response::{EmployeeForm, GenerateReportForm, MissionForm};

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a domain validation error against the field it concerns.
    pub fn add_domain_error(&mut self, err: &DomainError) {
        let field: &str = match err {
            DomainError::InvalidDateRange => NON_FIELD_ERRORS,
            other => domain_error_field(other).unwrap_or(NON_FIELD_ERRORS),
        };
        self.add(field, err.to_string());
    }

    /// Returns the messages recorded against a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns whether a field has any messages.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Succeeds when empty, otherwise fails with `ApiError::InvalidForm`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if there are any.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::InvalidForm { errors: self })
        }
    }
}

/// Resolves an optional division choice.
fn clean_division(
    persistence: &mut SqlitePersistence,
    errors: &mut FieldErrors,
    division: Option<i64>,
) -> Result<Option<i64>, ApiError> {
    let Some(division_id) = division else {
        return Ok(None);
    };
    if persistence.get_division(division_id)?.is_some() {
        Ok(Some(division_id))
    } else {
        errors.add("division", INVALID_CHOICE);
        Ok(None)
    }
}

/// Resolves a required clearance level.
fn clean_clearance(errors: &mut FieldErrors, level: Option<i64>) -> Option<SecurityClearance> {
    let Some(level) = level else {
        errors.add("security_clearance", REQUIRED);
        return None;
    };
    match SecurityClearance::from_level(level) {
        Ok(clearance) => Some(clearance),
        Err(e) => {
            errors.add_domain_error(&e);
            None
        }
    }
}

/// Parses one date field, recording a failure against that field.
fn clean_datetime(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<OffsetDateTime> {
    match parse_optional_datetime(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

/// Cleans a submitted mission form into a `Mission`.
///
/// The supervisor must be an existing employee in `ISS_Admin_User`; the
/// division, when given, must exist.
///
/// # Arguments
///
/// * `persistence` - The persistence layer, for reference lookups
/// * `form` - The submitted form
/// * `mission_id` - The mission being updated, `None` on create
///
/// # Errors
///
/// Returns `ApiError::InvalidForm` listing every invalid field, or a
/// persistence error if a lookup fails.
pub fn clean_mission_form(
    persistence: &mut SqlitePersistence,
    form: &MissionForm,
    mission_id: Option<i64>,
) -> Result<Mission, ApiError> {
    let mut errors: FieldErrors = FieldErrors::new();

    let name: String = form.name.trim().to_string();
    let description: Option<String> = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let division_id: Option<i64> = clean_division(persistence, &mut errors, form.division)?;

    let supervisor_id: Option<i64> = match form.supervisor {
        None => {
            errors.add("supervisor", REQUIRED);
            None
        }
        Some(employee_id) => {
            let eligible: bool = persistence.get_employee(employee_id)?.is_some()
                && persistence.is_employee_in_group(employee_id, Group::IssAdmin)?;
            if eligible {
                Some(employee_id)
            } else {
                errors.add("supervisor", INVALID_CHOICE);
                None
            }
        }
    };

    let security_clearance: Option<SecurityClearance> =
        clean_clearance(&mut errors, form.security_clearance);
    let start_date: Option<OffsetDateTime> =
        clean_datetime(&mut errors, "start_date", form.start_date.as_deref());
    let end_date: Option<OffsetDateTime> =
        clean_datetime(&mut errors, "end_date", form.end_date.as_deref());

    let mission: Mission = Mission {
        mission_id,
        name,
        description,
        division_id,
        supervisor_id: supervisor_id.unwrap_or_default(),
        start_date,
        end_date,
        security_clearance: security_clearance.unwrap_or(SecurityClearance::Baseline),
    };

    // Field rules stop at the first failure; the date order is always checked.
    if let Err(e) = validate_mission_fields(&mission) {
        errors.add_domain_error(&e);
    }
    if let Err(e) = validate_date_order(start_date, end_date)
        && !errors.contains(NON_FIELD_ERRORS)
    {
        errors.add_domain_error(&e);
    }

    errors.into_result()?;
    Ok(mission)
}

/// A cleaned report generation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedReportForm {
    /// The assignee, already checked to be in `NASA_Admin_User`.
    pub assigned_to: i64,
    pub summary: String,
}

/// Cleans a submitted report generation form.
///
/// # Errors
///
/// Returns `ApiError::InvalidForm` for missing or malformed fields, and
/// `ApiError::DomainRuleViolation` if the assignee exists but is not in
/// `NASA_Admin_User`.
pub fn clean_report_form(
    persistence: &mut SqlitePersistence,
    form: &GenerateReportForm,
) -> Result<CleanedReportForm, ApiError> {
    let mut errors: FieldErrors = FieldErrors::new();

    let assigned_to: Option<i64> = match form.assigned_to {
        None => {
            errors.add("assigned_to", REQUIRED);
            None
        }
        Some(employee_id) => {
            if persistence.get_employee(employee_id)?.is_some() {
                Some(employee_id)
            } else {
                errors.add("assigned_to", INVALID_CHOICE);
                None
            }
        }
    };

    if let Err(e) = validate_report_summary(&form.report_summary) {
        errors.add_domain_error(&e);
    }

    errors.into_result()?;

    let assigned_to: i64 = assigned_to.ok_or_else(|| ApiError::Internal {
        message: String::from("Assignee missing after cleaning"),
    })?;

    if !persistence.is_employee_in_group(assigned_to, Group::NasaAdmin)? {
        return Err(DomainError::IneligibleAssignee {
            employee_id: assigned_to,
        }
        .into());
    }

    Ok(CleanedReportForm {
        assigned_to,
        summary: form.report_summary.clone(),
    })
}

/// Cleans a submitted employee profile form.
///
/// The social security number is validated and sealed here, so the
/// returned `Employee` never holds plaintext.
///
/// # Errors
///
/// Returns `ApiError::InvalidForm` for invalid fields, and
/// `ApiError::DomainRuleViolation` if the account already has a profile.
pub fn clean_employee_form(
    persistence: &mut SqlitePersistence,
    cipher: &FieldCipher,
    form: &EmployeeForm,
) -> Result<Employee, ApiError> {
    let mut errors: FieldErrors = FieldErrors::new();

    let account: Option<UserAccountData> = persistence.get_user_by_id(form.user_id)?;
    if account.is_none() {
        errors.add("user_id", INVALID_CHOICE);
    }

    let division_id: Option<i64> = clean_division(persistence, &mut errors, form.division)?;
    let security_clearance: Option<SecurityClearance> =
        clean_clearance(&mut errors, form.security_clearance);

    let ssn: Option<SocialSecurityNumber> = if form.social_security_number.trim().is_empty() {
        None
    } else {
        match SocialSecurityNumber::parse(&form.social_security_number) {
            Ok(ssn) => Some(ssn),
            Err(e) => {
                errors.add_domain_error(&e);
                None
            }
        }
    };

    let account_name: AccountName = account.as_ref().map_or_else(
        || AccountName {
            username: String::new(),
            first_name: String::new(),
            last_name: String::new(),
        },
        |a| AccountName {
            username: a.username.clone(),
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
        },
    );

    let mut employee: Employee = Employee {
        employee_id: None,
        user_id: form.user_id,
        account: account_name,
        division_id,
        address: form.address.trim().to_string(),
        phone_number: form.phone_number.trim().to_string(),
        sealed_social_security_number: None,
        security_clearance: security_clearance.unwrap_or(SecurityClearance::Baseline),
    };

    if let Err(e) = validate_employee_fields(&employee) {
        errors.add_domain_error(&e);
    }

    errors.into_result()?;

    if persistence.get_employee_by_user(form.user_id)?.is_some() {
        return Err(DomainError::DuplicateEmployeeProfile {
            user_id: form.user_id,
        }
        .into());
    }

    employee.sealed_social_security_number =
        ssn.map(|ssn| cipher.seal_ssn(&ssn)).transpose()?;

    Ok(employee)
}
