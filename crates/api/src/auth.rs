// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use std::collections::BTreeSet;

use missions_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use missions_domain::{Employee, Group, Permission, PermissionSet, effective_permissions};
use missions_persistence::{PersistenceError, SessionData, SqlitePersistence, UserAccountData};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// Reason given for every rejected login, whatever the cause.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// An authenticated account with everything needed to authorize requests.
///
/// Resolved once per request from the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The account identifier.
    pub user_id: i64,
    /// The account username.
    pub username: String,
    /// Whether the account is a superuser.
    pub is_superuser: bool,
    /// Groups the account belongs to.
    pub groups: BTreeSet<Group>,
    /// Effective permissions (direct grants plus group grants).
    pub permissions: PermissionSet,
    /// The employee profile of the account, if it has one.
    pub employee: Option<Employee>,
}

impl Principal {
    /// Returns whether the principal holds a permission.
    #[must_use]
    pub fn has_perm(&self, permission: Permission) -> bool {
        self.permissions.has(permission)
    }

    /// Returns whether the principal belongs to a group.
    #[must_use]
    pub fn in_group(&self, group: Group) -> bool {
        self.groups.contains(&group)
    }

    /// Returns the identifier of the principal's employee profile.
    #[must_use]
    pub fn employee_id(&self) -> Option<i64> {
        self.employee.as_ref().and_then(|e| e.employee_id)
    }

    /// Converts this principal into an audit Actor.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(Some(self.user_id), self.username.clone())
    }
}

/// Authorization service for enforcing permission checks.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the principal holds `permission`.
    ///
    /// # Arguments
    ///
    /// * `principal` - The authenticated principal
    /// * `permission` - The permission required
    /// * `action` - The action being attempted, for the error and log
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` if the permission is missing.
    pub fn require(
        principal: &Principal,
        permission: Permission,
        action: &str,
    ) -> Result<(), AuthError> {
        if principal.has_perm(permission) {
            return Ok(());
        }

        warn!(
            username = %principal.username,
            permission = %permission,
            action,
            "Permission denied"
        );
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_permission: permission.qualified_name(),
        })
    }

    /// Checks that the principal is a superuser.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` otherwise.
    pub fn require_superuser(principal: &Principal, action: &str) -> Result<(), AuthError> {
        if principal.is_superuser {
            return Ok(());
        }

        warn!(username = %principal.username, action, "Superuser required");
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_permission: String::from("superuser"),
        })
    }
}

/// Authentication service for session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Session lifetime.
    pub const SESSION_EXPIRATION: Duration = Duration::days(14);

    /// Authenticates an account and creates a session.
    ///
    /// Unknown usernames, inactive accounts and wrong passwords are
    /// rejected with the same reason.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `username` - The account username
    /// * `password` - The plaintext password
    /// * `cause` - The cause recorded on the login audit event
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `session`, `principal`)
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub fn login(
        persistence: &mut SqlitePersistence,
        username: &str,
        password: &str,
        cause: Cause,
    ) -> Result<(String, SessionData, Principal), AuthError> {
        info!("User {username} is attempting to log in");

        let account: UserAccountData = persistence
            .get_user_by_username(username)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(Self::invalid_credentials)?;

        let password_matches: bool =
            SqlitePersistence::verify_password(password, &account.password_hash)
                .map_err(Self::map_persistence_error)?;

        if !password_matches || !account.is_active {
            debug!(username, "Login rejected");
            return Err(Self::invalid_credentials());
        }

        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = OffsetDateTime::now_utc() + Self::SESSION_EXPIRATION;

        let event: AuditEvent = AuditEvent::new(
            Actor::new(Some(account.user_id), account.username.clone()),
            cause,
            Action::new(String::from("Login"), None),
            None,
            StateSnapshot::absent(),
            StateSnapshot::absent(),
        );

        persistence
            .create_session(&session_token, account.user_id, expires_at, &event)
            .map_err(Self::map_persistence_error)?;

        let session: SessionData = persistence
            .get_session_by_token(&session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Session not found after creation"),
            })?;

        let principal: Principal = Self::resolve_principal(persistence, &account)?;

        info!("User {username} has logged in successfully");

        Ok((session_token, session, principal))
    }

    /// Validates a session token and returns the principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is unknown or expired, or the account
    /// is gone or inactive.
    pub fn validate_session(
        persistence: &mut SqlitePersistence,
        session_token: &str,
    ) -> Result<Principal, AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&session.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;

        if OffsetDateTime::now_utc() > expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let account: UserAccountData = persistence
            .get_user_by_id(session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Account not found"),
            })?;

        if !account.is_active {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is inactive"),
            });
        }

        persistence
            .update_session_activity(session.session_id)
            .map_err(Self::map_persistence_error)?;

        Self::resolve_principal(persistence, &account)
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not exist or the delete fails.
    pub fn logout(
        persistence: &mut SqlitePersistence,
        session_token: &str,
        principal: &Principal,
        cause: Cause,
    ) -> Result<(), AuthError> {
        let event: AuditEvent = AuditEvent::new(
            principal.to_audit_actor(),
            cause,
            Action::new(String::from("Logout"), None),
            None,
            StateSnapshot::absent(),
            StateSnapshot::absent(),
        );

        persistence
            .delete_session(session_token, &event)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })?;

        info!(username = %principal.username, "User logged out");
        Ok(())
    }

    /// Loads groups, permissions and employee profile for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if any lookup fails.
    pub fn resolve_principal(
        persistence: &mut SqlitePersistence,
        account: &UserAccountData,
    ) -> Result<Principal, AuthError> {
        let groups: BTreeSet<Group> = persistence
            .get_user_groups(account.user_id)
            .map_err(Self::map_persistence_error)?;
        let user_permissions: Vec<Permission> = persistence
            .get_user_permissions(account.user_id)
            .map_err(Self::map_persistence_error)?;
        let group_permissions: Vec<Permission> = persistence
            .get_group_permissions_for_user(account.user_id)
            .map_err(Self::map_persistence_error)?;
        let employee: Option<Employee> = persistence
            .get_employee_by_user(account.user_id)
            .map_err(Self::map_persistence_error)?;

        Ok(Principal {
            user_id: account.user_id,
            username: account.username.clone(),
            is_superuser: account.is_superuser,
            groups,
            permissions: effective_permissions(
                account.is_active,
                account.is_superuser,
                &user_permissions,
                &group_permissions,
            ),
            employee,
        })
    }

    /// Generates an opaque 256-bit session token.
    fn generate_session_token() -> String {
        let mut bytes = [0u8; 32];
        rand::fill(&mut bytes);
        hex::encode(bytes)
    }

    fn invalid_credentials() -> AuthError {
        AuthError::AuthenticationFailed {
            reason: String::from(INVALID_CREDENTIALS),
        }
    }

    /// Maps persistence errors to authentication errors.
    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}
