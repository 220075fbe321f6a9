// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Division and employee mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_domain::{Division, Employee};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{divisions, employees};
use crate::error::PersistenceError;

/// Inserts a division.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_division(
    conn: &mut SqliteConnection,
    division: &Division,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(divisions::table)
        .values(divisions::name.eq(division.name()))
        .execute(conn)?;

    let division_id: i64 = conn.get_last_insert_rowid()?;
    info!(division_id, name = division.name(), "Division created");
    Ok(division_id)
}

/// Inserts an employee profile.
///
/// The social security number must already be sealed.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the account already has
/// a profile, or `PersistenceError::ForeignKeyViolation` if the account or
/// division does not exist.
pub fn insert_employee(
    conn: &mut SqliteConnection,
    employee: &Employee,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(employees::table)
        .values((
            employees::user_id.eq(employee.user_id),
            employees::division_id.eq(employee.division_id),
            employees::address.eq(&employee.address),
            employees::phone_number.eq(&employee.phone_number),
            employees::social_security_number
                .eq(employee.sealed_social_security_number.as_deref()),
            employees::security_clearance.eq(employee.security_clearance.level()),
        ))
        .execute(conn)?;

    let employee_id: i64 = conn.get_last_insert_rowid()?;
    info!(employee_id, user_id = employee.user_id, "Employee profile created");
    Ok(employee_id)
}

/// Deletes an employee profile.
///
/// Missions the employee supervises are deleted with it; reports assigned
/// to the employee lose their assignee.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> Result<bool, PersistenceError> {
    let deleted: usize = diesel::delete(employees::table)
        .filter(employees::employee_id.eq(employee_id))
        .execute(conn)?;

    info!(employee_id, deleted, "Employee delete");
    Ok(deleted > 0)
}

/// Deletes a division. Employees and missions in it lose their division.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_division(
    conn: &mut SqliteConnection,
    division_id: i64,
) -> Result<bool, PersistenceError> {
    let deleted: usize = diesel::delete(divisions::table)
        .filter(divisions::division_id.eq(division_id))
        .execute(conn)?;

    info!(division_id, deleted, "Division delete");
    Ok(deleted > 0)
}
