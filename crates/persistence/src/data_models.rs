// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use missions_domain::Group;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccountData {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

/// The fields needed to create a user account.
///
/// The password is plaintext here and hashed on insert.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUserAccount {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    /// Groups joined along with the account.
    pub groups: Vec<Group>,
}

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}
