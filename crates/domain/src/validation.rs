// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::DomainError;
use crate::types::{
    DEFAULT_DESCRIPTION_LENGTH, DEFAULT_NAME_LENGTH, MAX_ADDRESS_LENGTH, MAX_PHONE_NUMBER_LENGTH,
    Employee, Mission, MissionReport,
};

/// Validates that a mission's field constraints are met.
///
/// This does NOT check that referenced rows exist or that the supervisor
/// is eligible; both require persistence context.
///
/// # Errors
///
/// Returns an error if:
/// - The name is empty or longer than `DEFAULT_NAME_LENGTH`
/// - The description is longer than `DEFAULT_DESCRIPTION_LENGTH`
/// - The end date precedes the start date
pub fn validate_mission_fields(mission: &Mission) -> Result<(), DomainError> {
    // Rule: name must not be empty
    if mission.name.trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Name cannot be empty",
        )));
    }

    if mission.name.chars().count() > DEFAULT_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "Name must be at most {DEFAULT_NAME_LENGTH} characters"
        )));
    }

    if let Some(description) = &mission.description
        && description.chars().count() > DEFAULT_DESCRIPTION_LENGTH
    {
        return Err(DomainError::InvalidDescription(format!(
            "Description must be at most {DEFAULT_DESCRIPTION_LENGTH} characters"
        )));
    }

    validate_date_order(mission.start_date, mission.end_date)
}

/// Validates that the end date-time does not precede the start date-time.
///
/// Either bound may be missing, in which case there is nothing to compare.
///
/// # Errors
///
/// Returns `DomainError::InvalidDateRange` if `end < start`.
pub fn validate_date_order(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
) -> Result<(), DomainError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(DomainError::InvalidDateRange);
    }
    Ok(())
}

/// Validates a division name.
///
/// # Errors
///
/// Returns an error if the name is empty or too long.
pub fn validate_division_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidDivisionName(String::from(
            "Name cannot be empty",
        )));
    }
    if name.chars().count() > DEFAULT_NAME_LENGTH {
        return Err(DomainError::InvalidDivisionName(format!(
            "Name must be at most {DEFAULT_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates the summary text submitted when generating a report.
///
/// # Errors
///
/// Returns an error if the summary is empty or too long.
pub fn validate_report_summary(summary: &str) -> Result<(), DomainError> {
    if summary.trim().is_empty() {
        return Err(DomainError::InvalidSummary(String::from(
            "Summary cannot be empty",
        )));
    }
    if summary.chars().count() > DEFAULT_DESCRIPTION_LENGTH {
        return Err(DomainError::InvalidSummary(format!(
            "Summary must be at most {DEFAULT_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates a mission report before it is stored.
///
/// Titles are generated from the mission name plus a counter, so they are
/// never capped. A name at the length limit still gets reports.
///
/// # Errors
///
/// Returns an error if the title is blank or the summary is invalid.
pub fn validate_report_fields(report: &MissionReport) -> Result<(), DomainError> {
    if report.title.trim().is_empty() {
        return Err(DomainError::InvalidTitle(String::from(
            "Title cannot be empty",
        )));
    }
    validate_report_summary(&report.summary)
}

/// Validates an employee profile's contact fields.
///
/// Address and phone number may be blank. The social security number is
/// validated separately, before it is sealed.
///
/// # Errors
///
/// Returns an error if the address or phone number is too long.
pub fn validate_employee_fields(employee: &Employee) -> Result<(), DomainError> {
    if employee.address.chars().count() > MAX_ADDRESS_LENGTH {
        return Err(DomainError::InvalidAddress(format!(
            "Address must be at most {MAX_ADDRESS_LENGTH} characters"
        )));
    }

    if employee.phone_number.chars().count() > MAX_PHONE_NUMBER_LENGTH {
        return Err(DomainError::InvalidPhoneNumber(format!(
            "Phone number must be at most {MAX_PHONE_NUMBER_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Parses an optional RFC 3339 date-time.
///
/// Missing and blank values both mean "not set".
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the value is not RFC 3339.
pub fn parse_optional_datetime(value: Option<&str>) -> Result<Option<OffsetDateTime>, DomainError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    OffsetDateTime::parse(value, &Rfc3339)
        .map(Some)
        .map_err(|e| DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        })
}

/// Formats a date-time as RFC 3339.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the value cannot be represented
/// (years outside 0..=9999).
pub fn format_datetime(value: OffsetDateTime) -> Result<String, DomainError> {
    value
        .format(&Rfc3339)
        .map_err(|e| DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        })
}
