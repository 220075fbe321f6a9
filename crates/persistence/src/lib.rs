// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Mission Tracker.
//!
//! This crate stores accounts, sessions, the organisation directory,
//! missions, mission reports, and the audit log in `SQLite` through Diesel.
//!
//! ## Database
//!
//! - File databases run in WAL mode.
//! - In-memory databases are shared-cache URIs with a unique name per
//!   instance, so tests are isolated from each other.
//! - Foreign key enforcement is switched on and verified at startup.
//!   Cascade and null-on-delete policies rely on it.
//! - Schema migrations are embedded and applied on open.
//!
//! ## Audit
//!
//! Every mutating method takes the audit event describing it and writes
//! both in one transaction: either the change and its event are stored,
//! or neither is.

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
#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use diesel::{Connection, SqliteConnection};
use missions_audit::{AuditEvent, AuditTarget, TargetKind};
use missions_domain::{
    Division, Employee, Group, Mission, MissionReport, MissionScope, Permission, ReportScope,
};
use time::OffsetDateTime;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Minimum bcrypt cost, used for in-memory databases.
const IN_MEMORY_PASSWORD_COST: u32 = 4;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod timestamps;

#[cfg(test)]
mod tests;

pub use data_models::{NewUserAccount, SessionData, UserAccountData};
pub use error::PersistenceError;
pub use queries::StoredAuditEvent;

use backend::PersistenceBackend;

/// Type alias kept for callers that name the backend explicitly.
pub type SqlitePersistence = Persistence;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
    password_cost: u32,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance. Passwords are hashed
    /// with the minimum bcrypt cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url = format!("file:missions_memdb_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        conn.verify_foreign_key_enforcement()?;

        Ok(Self {
            conn,
            password_cost: IN_MEMORY_PASSWORD_COST,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        conn.verify_foreign_key_enforcement()?;

        Ok(Self {
            conn,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Creates an account, joins it to `account.groups` and records `event`.
    ///
    /// Everything is written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the username is taken.
    pub fn create_user(
        &mut self,
        account: &NewUserAccount,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        let cost: u32 = self.password_cost;
        self.conn.transaction(|conn| {
            let user_id: i64 = mutations::accounts::create_user(conn, account, cost)?;
            for group in &account.groups {
                mutations::accounts::add_user_to_group(conn, user_id, *group)?;
            }
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Account, user_id)),
            )?;
            Ok(user_id)
        })
    }

    /// Retrieves an account by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<UserAccountData>, PersistenceError> {
        queries::accounts::get_user_by_username(&mut self.conn, username)
    }

    /// Retrieves an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(
        &mut self,
        user_id: i64,
    ) -> Result<Option<UserAccountData>, PersistenceError> {
        queries::accounts::get_user_by_id(&mut self.conn, user_id)
    }

    /// Lists all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_users(&mut self) -> Result<Vec<UserAccountData>, PersistenceError> {
        queries::accounts::list_users(&mut self.conn)
    }

    /// Counts all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_users(&mut self) -> Result<i64, PersistenceError> {
        queries::accounts::count_users(&mut self.conn)
    }

    /// Activates or deactivates an account and records `event`.
    ///
    /// Deactivation also ends every session of the account.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the account does not exist.
    pub fn set_user_active(
        &mut self,
        user_id: i64,
        is_active: bool,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::accounts::set_user_active(conn, user_id, is_active)?;
            if !is_active {
                mutations::sessions::delete_sessions_for_user(conn, user_id)?;
            }
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Account, user_id)),
            )?;
            Ok(())
        })
    }

    /// Verifies a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
        queries::accounts::verify_password(password, password_hash)
    }

    /// Returns the groups an account belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_groups(&mut self, user_id: i64) -> Result<BTreeSet<Group>, PersistenceError> {
        queries::accounts::get_user_groups(&mut self.conn, user_id)
    }

    /// Adds an account to a group and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ForeignKeyViolation` if the account does not exist.
    pub fn add_user_to_group(
        &mut self,
        user_id: i64,
        group: Group,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::accounts::add_user_to_group(conn, user_id, group)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Account, user_id)),
            )?;
            Ok(())
        })
    }

    /// Grants a permission directly to an account and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ForeignKeyViolation` if the account does not exist.
    pub fn grant_user_permission(
        &mut self,
        user_id: i64,
        permission: Permission,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::accounts::grant_user_permission(conn, user_id, permission)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Account, user_id)),
            )?;
            Ok(())
        })
    }

    /// Returns the permissions granted directly to an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_permissions(&mut self, user_id: i64) -> Result<Vec<Permission>, PersistenceError> {
        queries::accounts::get_user_permissions(&mut self.conn, user_id)
    }

    /// Returns the permissions an account holds through its groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_group_permissions_for_user(
        &mut self,
        user_id: i64,
    ) -> Result<Vec<Permission>, PersistenceError> {
        queries::accounts::get_group_permissions_for_user(&mut self.conn, user_id)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Creates a session at login, records the login time and `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    pub fn create_session(
        &mut self,
        session_token: &str,
        user_id: i64,
        expires_at: OffsetDateTime,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        self.conn.transaction(|conn| {
            let session_id: i64 =
                mutations::sessions::create_session(conn, session_token, user_id, expires_at)?;
            mutations::accounts::update_last_login(conn, user_id)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Session, session_id)),
            )?;
            Ok(session_id)
        })
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::sessions::get_session_by_token(&mut self.conn, session_token)
    }

    /// Updates the last activity timestamp for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_session_activity(&mut self, session_id: i64) -> Result<(), PersistenceError> {
        mutations::sessions::update_session_activity(&mut self.conn, session_id)
    }

    /// Deletes a session at logout and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if no session has the token.
    pub fn delete_session(
        &mut self,
        session_token: &str,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::sessions::delete_session(conn, session_token)?;
            mutations::audit::persist_audit_event(conn, event, None)?;
            Ok(())
        })
    }

    /// Deletes all sessions that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_sessions(&mut self, now: OffsetDateTime) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_expired_sessions(&mut self.conn, now)
    }

    // ========================================================================
    // Directory
    // ========================================================================

    /// Creates a division and records `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_division(
        &mut self,
        division: &Division,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        self.conn.transaction(|conn| {
            let division_id: i64 = mutations::directory::insert_division(conn, division)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Division, division_id)),
            )?;
            Ok(division_id)
        })
    }

    /// Deletes a division and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the division does not exist.
    pub fn delete_division(
        &mut self,
        division_id: i64,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            if !mutations::directory::delete_division(conn, division_id)? {
                return Err(PersistenceError::NotFound(format!("division {division_id}")));
            }
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Division, division_id)),
            )?;
            Ok(())
        })
    }

    /// Lists all divisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_divisions(&mut self) -> Result<Vec<Division>, PersistenceError> {
        queries::directory::list_divisions(&mut self.conn)
    }

    /// Retrieves a division by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_division(&mut self, division_id: i64) -> Result<Option<Division>, PersistenceError> {
        queries::directory::get_division(&mut self.conn, division_id)
    }

    /// Creates an employee profile and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the account already
    /// has a profile.
    pub fn create_employee(
        &mut self,
        employee: &Employee,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        self.conn.transaction(|conn| {
            let employee_id: i64 = mutations::directory::insert_employee(conn, employee)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Employee, employee_id)),
            )?;
            Ok(employee_id)
        })
    }

    /// Deletes an employee profile and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the employee does not exist.
    pub fn delete_employee(
        &mut self,
        employee_id: i64,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            if !mutations::directory::delete_employee(conn, employee_id)? {
                return Err(PersistenceError::NotFound(format!("employee {employee_id}")));
            }
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::new(TargetKind::Employee, employee_id)),
            )?;
            Ok(())
        })
    }

    /// Retrieves an employee by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_employee(&mut self, employee_id: i64) -> Result<Option<Employee>, PersistenceError> {
        queries::directory::get_employee(&mut self.conn, employee_id)
    }

    /// Retrieves the employee profile of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_employee_by_user(
        &mut self,
        user_id: i64,
    ) -> Result<Option<Employee>, PersistenceError> {
        queries::directory::get_employee_by_user(&mut self.conn, user_id)
    }

    /// Lists all employees.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_employees(&mut self) -> Result<Vec<Employee>, PersistenceError> {
        queries::directory::list_employees(&mut self.conn)
    }

    /// Lists the employees whose account belongs to `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_employees_in_group(&mut self, group: Group) -> Result<Vec<Employee>, PersistenceError> {
        queries::directory::list_employees_in_group(&mut self.conn, group)
    }

    /// Returns whether an employee's account belongs to `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn is_employee_in_group(
        &mut self,
        employee_id: i64,
        group: Group,
    ) -> Result<bool, PersistenceError> {
        queries::directory::is_employee_in_group(&mut self.conn, employee_id, group)
    }

    // ========================================================================
    // Missions
    // ========================================================================

    /// Creates a mission and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ForeignKeyViolation` if the supervisor or
    /// division does not exist.
    pub fn create_mission(
        &mut self,
        mission: &Mission,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        self.conn.transaction(|conn| {
            let mission_id: i64 = mutations::missions::insert_mission(conn, mission)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::mission(mission_id)),
            )?;
            Ok(mission_id)
        })
    }

    /// Replaces a mission and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the mission does not exist.
    pub fn update_mission(
        &mut self,
        mission_id: i64,
        mission: &Mission,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::missions::update_mission(conn, mission_id, mission)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::mission(mission_id)),
            )?;
            Ok(())
        })
    }

    /// Deletes a mission with its reports and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the mission does not exist.
    pub fn delete_mission(
        &mut self,
        mission_id: i64,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::missions::delete_mission(conn, mission_id)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::mission(mission_id)),
            )?;
            Ok(())
        })
    }

    /// Retrieves a mission by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_mission(&mut self, mission_id: i64) -> Result<Option<Mission>, PersistenceError> {
        queries::missions::get_mission(&mut self.conn, mission_id)
    }

    /// Lists the missions in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_missions(&mut self, scope: MissionScope) -> Result<Vec<Mission>, PersistenceError> {
        queries::missions::list_missions(&mut self.conn, scope)
    }

    // ========================================================================
    // Mission reports
    // ========================================================================

    /// Creates a mission report and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ForeignKeyViolation` if the mission or
    /// assignee does not exist.
    pub fn create_report(
        &mut self,
        report: &MissionReport,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        self.conn.transaction(|conn| {
            let report_id: i64 = mutations::missions::insert_report(conn, report)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::mission_report(report_id)),
            )?;
            Ok(report_id)
        })
    }

    /// Deletes a mission report and records `event`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the report does not exist.
    pub fn delete_report(
        &mut self,
        report_id: i64,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn.transaction(|conn| {
            mutations::missions::delete_report(conn, report_id)?;
            mutations::audit::persist_audit_event(
                conn,
                event,
                Some(AuditTarget::mission_report(report_id)),
            )?;
            Ok(())
        })
    }

    /// Retrieves a mission report by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_report(&mut self, report_id: i64) -> Result<Option<MissionReport>, PersistenceError> {
        queries::missions::get_report(&mut self.conn, report_id)
    }

    /// Lists the reports of one mission.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_reports_for_mission(
        &mut self,
        mission_id: i64,
    ) -> Result<Vec<MissionReport>, PersistenceError> {
        queries::missions::list_reports_for_mission(&mut self.conn, mission_id)
    }

    /// Counts the reports of one mission.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_reports_for_mission(&mut self, mission_id: i64) -> Result<i64, PersistenceError> {
        queries::missions::count_reports_for_mission(&mut self.conn, mission_id)
    }

    /// Lists the reports in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_reports(&mut self, scope: ReportScope) -> Result<Vec<MissionReport>, PersistenceError> {
        queries::missions::list_reports(&mut self.conn, scope)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists a standalone audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event, None)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if no event has the ID.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<StoredAuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Lists the most recent audit events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_recent_audit_events(
        &mut self,
        limit: i64,
    ) -> Result<Vec<StoredAuditEvent>, PersistenceError> {
        queries::audit::list_recent_audit_events(&mut self.conn, limit)
    }

    /// Lists the audit events that touched one record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_audit_events_for_target(
        &mut self,
        target: AuditTarget,
    ) -> Result<Vec<StoredAuditEvent>, PersistenceError> {
        queries::audit::list_audit_events_for_target(&mut self.conn, target)
    }
}
