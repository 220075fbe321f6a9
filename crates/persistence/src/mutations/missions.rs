// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mission and mission report mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_domain::{Mission, MissionReport};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{mission_reports, missions};
use crate::error::PersistenceError;
use crate::timestamps;

/// Inserts a mission.
///
/// # Errors
///
/// Returns `PersistenceError::ForeignKeyViolation` if the supervisor or
/// division does not exist.
pub fn insert_mission(conn: &mut SqliteConnection, mission: &Mission) -> Result<i64, PersistenceError> {
    let start_date: Option<String> = timestamps::optional_to_text(mission.start_date)?;
    let end_date: Option<String> = timestamps::optional_to_text(mission.end_date)?;

    diesel::insert_into(missions::table)
        .values((
            missions::name.eq(&mission.name),
            missions::description.eq(mission.description.as_deref()),
            missions::division_id.eq(mission.division_id),
            missions::supervisor_id.eq(mission.supervisor_id),
            missions::start_date.eq(start_date),
            missions::end_date.eq(end_date),
            missions::security_clearance.eq(mission.security_clearance.level()),
        ))
        .execute(conn)?;

    let mission_id: i64 = conn.get_last_insert_rowid()?;
    info!(mission_id, name = %mission.name, "Mission created");
    Ok(mission_id)
}

/// Replaces every field of a mission.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the mission does not exist.
pub fn update_mission(
    conn: &mut SqliteConnection,
    mission_id: i64,
    mission: &Mission,
) -> Result<(), PersistenceError> {
    let start_date: Option<String> = timestamps::optional_to_text(mission.start_date)?;
    let end_date: Option<String> = timestamps::optional_to_text(mission.end_date)?;

    let updated: usize = diesel::update(missions::table)
        .filter(missions::mission_id.eq(mission_id))
        .set((
            missions::name.eq(&mission.name),
            missions::description.eq(mission.description.as_deref()),
            missions::division_id.eq(mission.division_id),
            missions::supervisor_id.eq(mission.supervisor_id),
            missions::start_date.eq(start_date),
            missions::end_date.eq(end_date),
            missions::security_clearance.eq(mission.security_clearance.level()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("mission {mission_id}")));
    }

    info!(mission_id, "Mission updated");
    Ok(())
}

/// Deletes a mission together with its reports.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the mission does not exist.
pub fn delete_mission(conn: &mut SqliteConnection, mission_id: i64) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(missions::table)
        .filter(missions::mission_id.eq(mission_id))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!("mission {mission_id}")));
    }

    info!(mission_id, "Mission deleted");
    Ok(())
}

/// Inserts a mission report.
///
/// # Errors
///
/// Returns `PersistenceError::ForeignKeyViolation` if the mission or
/// assignee does not exist.
pub fn insert_report(
    conn: &mut SqliteConnection,
    report: &MissionReport,
) -> Result<i64, PersistenceError> {
    let publish_date: String = timestamps::to_text(report.publish_date)?;

    diesel::insert_into(mission_reports::table)
        .values((
            mission_reports::title.eq(&report.title),
            mission_reports::mission_id.eq(report.mission_id),
            mission_reports::assigned_to.eq(report.assigned_to),
            mission_reports::publish_date.eq(&publish_date),
            mission_reports::summary.eq(&report.summary),
        ))
        .execute(conn)?;

    let report_id: i64 = conn.get_last_insert_rowid()?;
    info!(report_id, mission_id = report.mission_id, title = %report.title, "Mission report created");
    Ok(report_id)
}

/// Deletes a mission report.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the report does not exist.
pub fn delete_report(conn: &mut SqliteConnection, report_id: i64) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(mission_reports::table)
        .filter(mission_reports::report_id.eq(report_id))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!("mission report {report_id}")));
    }

    info!(report_id, "Mission report deleted");
    Ok(())
}
