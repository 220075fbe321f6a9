// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities expose what actions a principal may perform so clients can
//! hide controls. They are advisory only and do not replace the permission
//! checks in the handlers.

use missions_domain::Permission;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;

/// Actions available on a single mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionCapabilities {
    /// `missions.change_mission`
    pub can_update: bool,
    /// `missions.delete_mission`
    pub can_delete: bool,
    /// `missions.add_missionreport`
    pub can_add_report: bool,
}

/// Computes the mission actions available to a principal.
///
/// Missions carry no per-record ownership rules, so only permissions matter.
#[must_use]
pub fn compute_mission_capabilities(principal: &Principal) -> MissionCapabilities {
    MissionCapabilities {
        can_update: principal.has_perm(Permission::ChangeMission),
        can_delete: principal.has_perm(Permission::DeleteMission),
        can_add_report: principal.has_perm(Permission::AddMissionReport),
    }
}

/// Returns whether the principal may create missions.
#[must_use]
pub fn can_add_mission(principal: &Principal) -> bool {
    principal.has_perm(Permission::AddMission)
}
