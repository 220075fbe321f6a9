// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod access;
mod clearance;
mod error;
mod report;
mod types;
mod validation;
mod visibility;

#[cfg(test)]
mod tests;

pub use access::{Group, Permission, PermissionSet, effective_permissions};
pub use clearance::SecurityClearance;
pub use error::DomainError;
pub use report::next_report_title;
pub use types::{
    AccountName, DEFAULT_DESCRIPTION_LENGTH, DEFAULT_NAME_LENGTH, Division, Employee,
    MAX_ADDRESS_LENGTH, MAX_PHONE_NUMBER_LENGTH, Mission, MissionReport, SocialSecurityNumber,
};
pub use validation::{
    format_datetime, parse_optional_datetime, validate_date_order, validate_division_name,
    validate_employee_fields, validate_mission_fields, validate_report_fields,
    validate_report_summary,
};
pub use visibility::{IndexScope, MissionScope, ReportScope, resolve_index_scope};
