// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Division and employee queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_domain::{AccountName, Division, Employee, Group, SecurityClearance};
use tracing::debug;

use crate::diesel_schema::{account_groups, divisions, employees, user_groups, users};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = divisions)]
struct DivisionRow {
    division_id: i64,
    name: String,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = employees)]
struct EmployeeRow {
    employee_id: i64,
    user_id: i64,
    division_id: Option<i64>,
    address: String,
    phone_number: String,
    social_security_number: Option<String>,
    security_clearance: i32,
}

/// The naming columns of the owning account.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct AccountNameRow {
    username: String,
    first_name: String,
    last_name: String,
}

fn to_employee(
    (row, name): (EmployeeRow, AccountNameRow),
) -> Result<Employee, PersistenceError> {
    let security_clearance: SecurityClearance =
        SecurityClearance::from_level(row.security_clearance).map_err(|e| {
            PersistenceError::CorruptRecord(format!("employee {}: {e}", row.employee_id))
        })?;

    Ok(Employee {
        employee_id: Some(row.employee_id),
        user_id: row.user_id,
        account: AccountName {
            username: name.username,
            first_name: name.first_name,
            last_name: name.last_name,
        },
        division_id: row.division_id,
        address: row.address,
        phone_number: row.phone_number,
        sealed_social_security_number: row.social_security_number,
        security_clearance,
    })
}

/// Lists all divisions ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_divisions(conn: &mut SqliteConnection) -> Result<Vec<Division>, PersistenceError> {
    let rows: Vec<DivisionRow> = divisions::table
        .select(DivisionRow::as_select())
        .order_by((divisions::name.asc(), divisions::division_id.asc()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| Division::with_id(row.division_id, &row.name))
        .collect())
}

/// Retrieves a division by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_division(
    conn: &mut SqliteConnection,
    division_id: i64,
) -> Result<Option<Division>, PersistenceError> {
    let row: Option<DivisionRow> = divisions::table
        .filter(divisions::division_id.eq(division_id))
        .select(DivisionRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(|row| Division::with_id(row.division_id, &row.name)))
}

/// Retrieves an employee by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or the row is corrupt.
pub fn get_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> Result<Option<Employee>, PersistenceError> {
    let row: Option<(EmployeeRow, AccountNameRow)> = employees::table
        .inner_join(users::table)
        .filter(employees::employee_id.eq(employee_id))
        .select((EmployeeRow::as_select(), AccountNameRow::as_select()))
        .first(conn)
        .optional()?;

    row.map(to_employee).transpose()
}

/// Retrieves the employee profile of an account.
///
/// # Errors
///
/// Returns an error if the database query fails or the row is corrupt.
pub fn get_employee_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<Employee>, PersistenceError> {
    let row: Option<(EmployeeRow, AccountNameRow)> = employees::table
        .inner_join(users::table)
        .filter(employees::user_id.eq(user_id))
        .select((EmployeeRow::as_select(), AccountNameRow::as_select()))
        .first(conn)
        .optional()?;

    row.map(to_employee).transpose()
}

/// Lists all employees ordered by username.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_employees(conn: &mut SqliteConnection) -> Result<Vec<Employee>, PersistenceError> {
    let rows: Vec<(EmployeeRow, AccountNameRow)> = employees::table
        .inner_join(users::table)
        .select((EmployeeRow::as_select(), AccountNameRow::as_select()))
        .order_by(users::username.asc())
        .load(conn)?;

    rows.into_iter().map(to_employee).collect()
}

/// Lists the employees whose account belongs to a group.
///
/// Used to build supervisor choices (ISS) and report assignee choices (NASA).
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_employees_in_group(
    conn: &mut SqliteConnection,
    group: Group,
) -> Result<Vec<Employee>, PersistenceError> {
    debug!("Listing employees in group {}", group);

    let rows: Vec<(EmployeeRow, AccountNameRow)> = employees::table
        .inner_join(users::table)
        .filter(
            employees::user_id.eq_any(
                user_groups::table
                    .inner_join(account_groups::table)
                    .filter(account_groups::name.eq(group.as_str()))
                    .select(user_groups::user_id),
            ),
        )
        .select((EmployeeRow::as_select(), AccountNameRow::as_select()))
        .order_by(users::username.asc())
        .load(conn)?;

    rows.into_iter().map(to_employee).collect()
}

/// Returns whether an employee's account belongs to a group.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn is_employee_in_group(
    conn: &mut SqliteConnection,
    employee_id: i64,
    group: Group,
) -> Result<bool, PersistenceError> {
    use diesel::dsl::count;

    let matches: i64 = employees::table
        .filter(employees::employee_id.eq(employee_id))
        .filter(
            employees::user_id.eq_any(
                user_groups::table
                    .inner_join(account_groups::table)
                    .filter(account_groups::name.eq(group.as_str()))
                    .select(user_groups::user_id),
            ),
        )
        .select(count(employees::employee_id))
        .first(conn)?;

    Ok(matches > 0)
}
