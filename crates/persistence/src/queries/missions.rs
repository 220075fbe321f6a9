// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mission and mission report queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use missions_domain::{Mission, MissionReport, MissionScope, ReportScope, SecurityClearance};
use tracing::debug;

use crate::diesel_schema::{mission_reports, missions};
use crate::error::PersistenceError;
use crate::timestamps;

#[derive(Queryable, Selectable)]
#[diesel(table_name = missions)]
struct MissionRow {
    mission_id: i64,
    name: String,
    description: Option<String>,
    division_id: Option<i64>,
    supervisor_id: i64,
    start_date: Option<String>,
    end_date: Option<String>,
    security_clearance: i32,
}

impl TryFrom<MissionRow> for Mission {
    type Error = PersistenceError;

    fn try_from(row: MissionRow) -> Result<Self, Self::Error> {
        let security_clearance: SecurityClearance =
            SecurityClearance::from_level(row.security_clearance).map_err(|e| {
                PersistenceError::CorruptRecord(format!("mission {}: {e}", row.mission_id))
            })?;

        Ok(Self {
            mission_id: Some(row.mission_id),
            name: row.name,
            description: row.description,
            division_id: row.division_id,
            supervisor_id: row.supervisor_id,
            start_date: timestamps::optional_from_text(row.start_date.as_deref())?,
            end_date: timestamps::optional_from_text(row.end_date.as_deref())?,
            security_clearance,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = mission_reports)]
struct MissionReportRow {
    report_id: i64,
    title: String,
    mission_id: i64,
    assigned_to: Option<i64>,
    publish_date: String,
    summary: String,
}

impl TryFrom<MissionReportRow> for MissionReport {
    type Error = PersistenceError;

    fn try_from(row: MissionReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            report_id: Some(row.report_id),
            title: row.title,
            mission_id: row.mission_id,
            assigned_to: row.assigned_to,
            publish_date: timestamps::from_text(&row.publish_date)?,
            summary: row.summary,
        })
    }
}

/// Retrieves a mission by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or the row is corrupt.
pub fn get_mission(
    conn: &mut SqliteConnection,
    mission_id: i64,
) -> Result<Option<Mission>, PersistenceError> {
    let row: Option<MissionRow> = missions::table
        .filter(missions::mission_id.eq(mission_id))
        .select(MissionRow::as_select())
        .first(conn)
        .optional()?;

    row.map(Mission::try_from).transpose()
}

/// Lists missions in a scope, in ID order.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_missions(
    conn: &mut SqliteConnection,
    scope: MissionScope,
) -> Result<Vec<Mission>, PersistenceError> {
    debug!(?scope, "Listing missions");

    let mut query = missions::table
        .select(MissionRow::as_select())
        .order_by(missions::mission_id.asc())
        .into_boxed();

    if let MissionScope::SupervisedBy(employee_id) = scope {
        query = query.filter(missions::supervisor_id.eq(employee_id));
    }

    let rows: Vec<MissionRow> = query.load(conn)?;
    rows.into_iter().map(Mission::try_from).collect()
}

/// Retrieves a mission report by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or the row is corrupt.
pub fn get_report(
    conn: &mut SqliteConnection,
    report_id: i64,
) -> Result<Option<MissionReport>, PersistenceError> {
    let row: Option<MissionReportRow> = mission_reports::table
        .filter(mission_reports::report_id.eq(report_id))
        .select(MissionReportRow::as_select())
        .first(conn)
        .optional()?;

    row.map(MissionReport::try_from).transpose()
}

/// Lists the reports of one mission in generation order.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_reports_for_mission(
    conn: &mut SqliteConnection,
    mission_id: i64,
) -> Result<Vec<MissionReport>, PersistenceError> {
    let rows: Vec<MissionReportRow> = mission_reports::table
        .filter(mission_reports::mission_id.eq(mission_id))
        .select(MissionReportRow::as_select())
        .order_by(mission_reports::report_id.asc())
        .load(conn)?;

    rows.into_iter().map(MissionReport::try_from).collect()
}

/// Counts the reports of one mission.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_reports_for_mission(
    conn: &mut SqliteConnection,
    mission_id: i64,
) -> Result<i64, PersistenceError> {
    use diesel::dsl::count;

    Ok(mission_reports::table
        .filter(mission_reports::mission_id.eq(mission_id))
        .select(count(mission_reports::report_id))
        .first(conn)?)
}

/// Lists reports in a scope, in ID order.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_reports(
    conn: &mut SqliteConnection,
    scope: ReportScope,
) -> Result<Vec<MissionReport>, PersistenceError> {
    debug!(?scope, "Listing mission reports");

    let mut query = mission_reports::table
        .select(MissionReportRow::as_select())
        .order_by(mission_reports::report_id.asc())
        .into_boxed();

    match scope {
        ReportScope::All => {}
        ReportScope::AssignedTo(employee_id) => {
            query = query.filter(mission_reports::assigned_to.eq(employee_id));
        }
        ReportScope::OfMissionsSupervisedBy(employee_id) => {
            query = query.filter(
                mission_reports::mission_id.eq_any(
                    missions::table
                        .filter(missions::supervisor_id.eq(employee_id))
                        .select(missions::mission_id),
                ),
            );
        }
    }

    let rows: Vec<MissionReportRow> = query.load(conn)?;
    rows.into_iter().map(MissionReport::try_from).collect()
}
