// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit log queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_audit::{Action, Actor, AuditEvent, AuditTarget, Cause, StateSnapshot, TargetKind};
use tracing::warn;

use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    actor_user_id: Option<i64>,
    actor_username: String,
    cause_id: String,
    cause_description: String,
    action_name: String,
    action_details: Option<String>,
    target_kind: Option<String>,
    target_id: Option<i64>,
    before_snapshot: String,
    after_snapshot: String,
    created_at: String,
}

/// A stored audit event and the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuditEvent {
    pub event: AuditEvent,
    pub created_at: String,
}

impl From<AuditEventRow> for StoredAuditEvent {
    fn from(row: AuditEventRow) -> Self {
        let target: Option<AuditTarget> = match (row.target_kind.as_deref(), row.target_id) {
            (Some(kind), Some(id)) => match TargetKind::parse(kind) {
                Some(kind) => Some(AuditTarget::new(kind, id)),
                None => {
                    warn!(event_id = row.event_id, kind, "Unknown audit target kind");
                    None
                }
            },
            _ => None,
        };

        let event: AuditEvent = AuditEvent::new(
            Actor::new(row.actor_user_id, row.actor_username),
            Cause::new(row.cause_id, row.cause_description),
            Action::new(row.action_name, row.action_details),
            target,
            StateSnapshot::new(row.before_snapshot),
            StateSnapshot::new(row.after_snapshot),
        )
        .with_event_id(row.event_id);

        Self {
            event,
            created_at: row.created_at,
        }
    }
}

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if no event has the ID.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<StoredAuditEvent, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("audit event {event_id}")))?;

    Ok(StoredAuditEvent::from(row))
}

/// Lists the most recent audit events, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_recent_audit_events(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<StoredAuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .select(AuditEventRow::as_select())
        .order_by(audit_events::event_id.desc())
        .limit(limit)
        .load(conn)?;

    Ok(rows.into_iter().map(StoredAuditEvent::from).collect())
}

/// Lists the audit events that touched one record, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_audit_events_for_target(
    conn: &mut SqliteConnection,
    target: AuditTarget,
) -> Result<Vec<StoredAuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::target_kind.eq(target.kind.as_str()))
        .filter(audit_events::target_id.eq(target.id))
        .select(AuditEventRow::as_select())
        .order_by(audit_events::event_id.asc())
        .load(conn)?;

    Ok(rows.into_iter().map(StoredAuditEvent::from).collect())
}
