// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account, group, and permission queries.

use std::collections::BTreeSet;
use std::str::FromStr;

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_domain::{Group, Permission};
use tracing::{debug, warn};

use crate::data_models::UserAccountData;
use crate::diesel_schema::{account_groups, group_permissions, user_groups, user_permissions, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
pub(crate) struct UserRow {
    user_id: i64,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    email: String,
    is_superuser: i32,
    is_active: i32,
    created_at: String,
    last_login_at: Option<String>,
}

impl From<UserRow> for UserAccountData {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_superuser: row.is_superuser != 0,
            is_active: row.is_active != 0,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}

/// Retrieves an account by username.
///
/// Usernames are case-sensitive.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no account matches.
pub fn get_user_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<UserAccountData>, PersistenceError> {
    debug!("Looking up account by username: {}", username);

    let row: Option<UserRow> = users::table
        .filter(users::username.eq(username))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(UserAccountData::from))
}

/// Retrieves an account by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no account matches.
pub fn get_user_by_id(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<UserAccountData>, PersistenceError> {
    let row: Option<UserRow> = users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(UserAccountData::from))
}

/// Lists all accounts ordered by username.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_users(conn: &mut SqliteConnection) -> Result<Vec<UserAccountData>, PersistenceError> {
    let rows: Vec<UserRow> = users::table
        .select(UserRow::as_select())
        .order_by(users::username.asc())
        .load(conn)?;

    Ok(rows.into_iter().map(UserAccountData::from).collect())
}

/// Counts all accounts.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_users(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    use diesel::dsl::count;

    let count: i64 = users::table.select(count(users::user_id)).first(conn)?;
    debug!("Total accounts: {}", count);
    Ok(count)
}

/// Returns the groups an account belongs to.
///
/// Group names the application does not know are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_user_groups(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<BTreeSet<Group>, PersistenceError> {
    let names: Vec<String> = user_groups::table
        .inner_join(account_groups::table)
        .filter(user_groups::user_id.eq(user_id))
        .select(account_groups::name)
        .load(conn)?;

    Ok(names
        .iter()
        .filter_map(|name| match Group::from_str(name) {
            Ok(group) => Some(group),
            Err(e) => {
                warn!(user_id, "Skipping group: {e}");
                None
            }
        })
        .collect())
}

/// Looks up the row ID of a group.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the group was not seeded.
pub fn get_group_id(conn: &mut SqliteConnection, group: Group) -> Result<i64, PersistenceError> {
    account_groups::table
        .filter(account_groups::name.eq(group.as_str()))
        .select(account_groups::group_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("group {group}")))
}

/// Returns the permissions granted directly to an account.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_user_permissions(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<Permission>, PersistenceError> {
    let codenames: Vec<String> = user_permissions::table
        .filter(user_permissions::user_id.eq(user_id))
        .select(user_permissions::codename)
        .load(conn)?;

    Ok(parse_permissions(user_id, &codenames))
}

/// Returns the permissions an account holds through its groups.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_group_permissions_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<Permission>, PersistenceError> {
    let codenames: Vec<String> = group_permissions::table
        .filter(
            group_permissions::group_id.eq_any(
                user_groups::table
                    .filter(user_groups::user_id.eq(user_id))
                    .select(user_groups::group_id),
            ),
        )
        .select(group_permissions::codename)
        .distinct()
        .load(conn)?;

    Ok(parse_permissions(user_id, &codenames))
}

fn parse_permissions(user_id: i64, codenames: &[String]) -> Vec<Permission> {
    codenames
        .iter()
        .filter_map(|codename| match Permission::from_str(codename) {
            Ok(permission) => Some(permission),
            Err(e) => {
                warn!(user_id, "Skipping permission: {e}");
                None
            }
        })
        .collect()
}

/// Verifies a password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    Ok(bcrypt::verify(password, password_hash)?)
}
