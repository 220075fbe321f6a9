// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clearance::SecurityClearance;
use crate::error::DomainError;

/// Maximum length of names and titles.
pub const DEFAULT_NAME_LENGTH: usize = 1024;
/// Maximum length of descriptions and report summaries.
pub const DEFAULT_DESCRIPTION_LENGTH: usize = 4096;
/// Maximum length of an employee address.
pub const MAX_ADDRESS_LENGTH: usize = 100;
/// Maximum length of an employee phone number.
pub const MAX_PHONE_NUMBER_LENGTH: usize = 14;

/// A division of the organisation; contains one or more employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    /// The canonical numeric identifier assigned by the database.
    /// `None` indicates the division has not been persisted yet.
    division_id: Option<i64>,
    name: String,
}

impl Division {
    /// Creates a new `Division` without a persisted ID.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            division_id: None,
            name: name.trim().to_owned(),
        }
    }

    /// Creates a `Division` with an existing persisted ID.
    #[must_use]
    pub fn with_id(division_id: i64, name: &str) -> Self {
        Self {
            division_id: Some(division_id),
            name: name.to_owned(),
        }
    }

    /// Returns the canonical numeric identifier if persisted.
    #[must_use]
    pub const fn division_id(&self) -> Option<i64> {
        self.division_id
    }

    /// Returns the division name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The naming fields of the account an employee profile is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountName {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl AccountName {
    /// Returns "First Last" when both names are set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return self.username.clone();
        }
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A validated, plaintext social security number.
///
/// Only ever held transiently: the persistence layer stores the sealed
/// (encrypted) form and responses only expose [`SocialSecurityNumber::masked`].
#[derive(Clone, PartialEq, Eq)]
pub struct SocialSecurityNumber(String);

impl SocialSecurityNumber {
    /// Parses a social security number.
    ///
    /// Hyphens and spaces are ignored; exactly nine ASCII digits must remain.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSocialSecurityNumber` otherwise.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let digits: String = value
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();

        if digits.len() != 9 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidSocialSecurityNumber(String::from(
                "Social security number must be exactly 9 digits",
            )));
        }

        Ok(Self(digits))
    }

    /// Returns the nine digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Returns the number with all but the last four digits hidden.
    #[must_use]
    pub fn masked(&self) -> String {
        format!("***-**-{}", &self.0[5..])
    }
}

impl std::fmt::Debug for SocialSecurityNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SocialSecurityNumber({})", self.masked())
    }
}

/// A single employee record with a division and clearance.
///
/// Every employee is the profile of exactly one user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Canonical identifier; `None` before first save.
    pub employee_id: Option<i64>,
    /// The owning account.
    pub user_id: i64,
    /// Naming fields copied from the owning account.
    pub account: AccountName,
    pub division_id: Option<i64>,
    pub address: String,
    pub phone_number: String,
    /// Encrypted social security number as stored, never plaintext.
    pub sealed_social_security_number: Option<String>,
    pub security_clearance: SecurityClearance,
}

impl Employee {
    /// Returns the name shown wherever the employee is listed.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.account.display_name()
    }
}

/// A mission that the organisation is working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Canonical identifier; `None` before first save.
    pub mission_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// Owning division. Cleared when the division is deleted.
    pub division_id: Option<i64>,
    /// Supervising employee. Deleting the supervisor deletes the mission.
    pub supervisor_id: i64,
    /// Date of commencement.
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    /// Date of completion.
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub security_clearance: SecurityClearance,
}

/// A report on a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionReport {
    /// Canonical identifier; `None` before first save.
    pub report_id: Option<i64>,
    pub title: String,
    pub mission_id: i64,
    /// Assigned employee. Cleared when the employee is deleted.
    pub assigned_to: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub publish_date: OffsetDateTime,
    pub summary: String,
}
