// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_audit::{AuditEvent, AuditTarget};
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;
use crate::timestamps;

/// Persists an audit event.
///
/// `target` overrides the event's own target; creates pass the row ID
/// they just inserted.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
    target: Option<AuditTarget>,
) -> Result<i64, PersistenceError> {
    let target: Option<AuditTarget> = target.or(event.target);
    let created_at: String = timestamps::now_text()?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::actor_user_id.eq(event.actor.user_id),
            audit_events::actor_username.eq(&event.actor.username),
            audit_events::cause_id.eq(&event.cause.id),
            audit_events::cause_description.eq(&event.cause.description),
            audit_events::action_name.eq(&event.action.name),
            audit_events::action_details.eq(event.action.details.as_deref()),
            audit_events::target_kind.eq(target.map(|t| t.kind.as_str())),
            audit_events::target_id.eq(target.map(|t| t.id)),
            audit_events::before_snapshot.eq(&event.before.data),
            audit_events::after_snapshot.eq(&event.after.data),
            audit_events::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let event_id: i64 = conn.get_last_insert_rowid()?;
    debug!(event_id, action = %event.action.name, "Audit event persisted");
    Ok(event_id)
}
