// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account, group membership, and permission mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_domain::{Group, Permission};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::NewUserAccount;
use crate::diesel_schema::{user_groups, user_permissions, users};
use crate::error::PersistenceError;
use crate::queries::accounts::get_group_id;
use crate::timestamps;

/// Creates a new account.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `account` - The account fields; the password is hashed here
/// * `password_cost` - The bcrypt cost factor
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the username is taken.
pub fn create_user(
    conn: &mut SqliteConnection,
    account: &NewUserAccount,
    password_cost: u32,
) -> Result<i64, PersistenceError> {
    info!(
        username = %account.username,
        is_superuser = account.is_superuser,
        "Creating account"
    );

    let password_hash: String = bcrypt::hash(&account.password, password_cost)?;
    let created_at: String = timestamps::now_text()?;

    diesel::insert_into(users::table)
        .values((
            users::username.eq(&account.username),
            users::password_hash.eq(&password_hash),
            users::first_name.eq(&account.first_name),
            users::last_name.eq(&account.last_name),
            users::email.eq(&account.email),
            users::is_superuser.eq(i32::from(account.is_superuser)),
            users::is_active.eq(1),
            users::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let user_id: i64 = conn.get_last_insert_rowid()?;
    info!(user_id, "Account created");
    Ok(user_id)
}

/// Records a successful login.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(conn: &mut SqliteConnection, user_id: i64) -> Result<(), PersistenceError> {
    debug!("Updating last_login_at for account ID: {}", user_id);

    let now: String = timestamps::now_text()?;
    diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set(users::last_login_at.eq(Some(now)))
        .execute(conn)?;

    Ok(())
}

/// Activates or deactivates an account.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the account does not exist.
pub fn set_user_active(
    conn: &mut SqliteConnection,
    user_id: i64,
    is_active: bool,
) -> Result<(), PersistenceError> {
    info!(user_id, is_active, "Setting account activity");

    let updated: usize = diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set(users::is_active.eq(i32::from(is_active)))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("account {user_id}")));
    }
    Ok(())
}

/// Adds an account to a group. Adding an existing member is a no-op.
///
/// # Errors
///
/// Returns an error if the group is missing or the insert fails.
pub fn add_user_to_group(
    conn: &mut SqliteConnection,
    user_id: i64,
    group: Group,
) -> Result<(), PersistenceError> {
    let group_id: i64 = get_group_id(conn, group)?;

    info!(user_id, group = %group, "Adding account to group");

    diesel::insert_or_ignore_into(user_groups::table)
        .values((
            user_groups::user_id.eq(user_id),
            user_groups::group_id.eq(group_id),
        ))
        .execute(conn)?;

    Ok(())
}

/// Grants a permission directly to an account. Granting twice is a no-op.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn grant_user_permission(
    conn: &mut SqliteConnection,
    user_id: i64,
    permission: Permission,
) -> Result<(), PersistenceError> {
    info!(user_id, permission = %permission, "Granting permission");

    diesel::insert_or_ignore_into(user_permissions::table)
        .values((
            user_permissions::user_id.eq(user_id),
            user_permissions::codename.eq(permission.codename()),
        ))
        .execute(conn)?;

    Ok(())
}
