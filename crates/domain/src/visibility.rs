// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Role-based visibility for the index page.

use std::collections::BTreeSet;

use crate::access::Group;

/// Which missions the index lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionScope {
    /// Every mission.
    All,
    /// Missions supervised by the employee.
    SupervisedBy(i64),
}

/// Which mission reports the index lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    /// Every report.
    All,
    /// Reports assigned to the employee.
    AssignedTo(i64),
    /// Reports belonging to missions supervised by the employee.
    OfMissionsSupervisedBy(i64),
}

/// The resolved index listing for a principal.
///
/// `None` means the listing is absent from the page, which is different
/// from an empty listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexScope {
    pub missions: Option<MissionScope>,
    pub mission_reports: Option<ReportScope>,
}

/// Resolves what the index shows.
///
/// Rules are applied in order, each later rule overriding earlier ones:
///
/// 1. NASA administrators with an employee profile see reports assigned to them.
/// 2. ISS administrators with an employee profile see the missions they
///    supervise and the reports of those missions.
/// 3. Superusers see everything, with or without an employee profile.
#[must_use]
pub fn resolve_index_scope(
    is_superuser: bool,
    employee_id: Option<i64>,
    groups: &BTreeSet<Group>,
) -> IndexScope {
    let mut scope: IndexScope = IndexScope::default();

    if let Some(employee_id) = employee_id {
        if groups.contains(&Group::NasaAdmin) {
            scope.mission_reports = Some(ReportScope::AssignedTo(employee_id));
        }

        if groups.contains(&Group::IssAdmin) {
            scope.missions = Some(MissionScope::SupervisedBy(employee_id));
            scope.mission_reports = Some(ReportScope::OfMissionsSupervisedBy(employee_id));
        }
    }

    if is_superuser {
        scope.missions = Some(MissionScope::All);
        scope.mission_reports = Some(ReportScope::All);
    }

    scope
}
