// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Groups and permissions.
//!
//! Permissions follow the `<app>.<verb>_<model>` codename convention and are
//! granted either directly to an account or through group membership.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Application label that prefixes every qualified permission name.
const APP_LABEL: &str = "missions";

/// A named group of accounts.
///
/// Both groups are seeded by the schema migration together with their
/// default permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Mission supervisors. Only members may be selected as a supervisor.
    #[serde(rename = "ISS_Admin_User")]
    IssAdmin,
    /// Report recipients. Only members may be assigned a report.
    #[serde(rename = "NASA_Admin_User")]
    NasaAdmin,
}

impl Group {
    /// Returns the stored group name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IssAdmin => "ISS_Admin_User",
            Self::NasaAdmin => "NASA_Admin_User",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ISS_Admin_User" => Ok(Self::IssAdmin),
            "NASA_Admin_User" => Ok(Self::NasaAdmin),
            _ => Err(DomainError::UnknownGroup(s.to_string())),
        }
    }
}

/// A single model permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    AddMission,
    ChangeMission,
    DeleteMission,
    ViewMission,
    AddMissionReport,
    ChangeMissionReport,
    DeleteMissionReport,
    ViewMissionReport,
    AddDivision,
    ChangeDivision,
    DeleteDivision,
    ViewDivision,
    AddEmployee,
    ChangeEmployee,
    DeleteEmployee,
    ViewEmployee,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::AddMission,
        Self::ChangeMission,
        Self::DeleteMission,
        Self::ViewMission,
        Self::AddMissionReport,
        Self::ChangeMissionReport,
        Self::DeleteMissionReport,
        Self::ViewMissionReport,
        Self::AddDivision,
        Self::ChangeDivision,
        Self::DeleteDivision,
        Self::ViewDivision,
        Self::AddEmployee,
        Self::ChangeEmployee,
        Self::DeleteEmployee,
        Self::ViewEmployee,
    ];

    /// Returns the bare codename as stored (e.g. `add_mission`).
    #[must_use]
    pub const fn codename(self) -> &'static str {
        match self {
            Self::AddMission => "add_mission",
            Self::ChangeMission => "change_mission",
            Self::DeleteMission => "delete_mission",
            Self::ViewMission => "view_mission",
            Self::AddMissionReport => "add_missionreport",
            Self::ChangeMissionReport => "change_missionreport",
            Self::DeleteMissionReport => "delete_missionreport",
            Self::ViewMissionReport => "view_missionreport",
            Self::AddDivision => "add_division",
            Self::ChangeDivision => "change_division",
            Self::DeleteDivision => "delete_division",
            Self::ViewDivision => "view_division",
            Self::AddEmployee => "add_employee",
            Self::ChangeEmployee => "change_employee",
            Self::DeleteEmployee => "delete_employee",
            Self::ViewEmployee => "view_employee",
        }
    }

    /// Returns the app-qualified name (e.g. `missions.add_mission`).
    #[must_use]
    pub fn qualified_name(self) -> String {
        format!("{APP_LABEL}.{}", self.codename())
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{APP_LABEL}.{}", self.codename())
    }
}

impl FromStr for Permission {
    type Err = DomainError;

    /// Accepts both the bare codename and the app-qualified form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let codename: &str = s
            .strip_prefix(APP_LABEL)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(s);

        Self::ALL
            .into_iter()
            .find(|perm| perm.codename() == codename)
            .ok_or_else(|| DomainError::UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.qualified_name())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The effective permissions of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Superusers implicitly hold every permission.
    all: bool,
    granted: BTreeSet<Permission>,
}

impl PermissionSet {
    /// A set holding every permission.
    #[must_use]
    pub const fn superuser() -> Self {
        Self {
            all: true,
            granted: BTreeSet::new(),
        }
    }

    /// A set holding exactly the given permissions.
    #[must_use]
    pub fn from_granted<I: IntoIterator<Item = Permission>>(granted: I) -> Self {
        Self {
            all: false,
            granted: granted.into_iter().collect(),
        }
    }

    /// Returns whether the permission is held.
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        self.all || self.granted.contains(&permission)
    }

    /// Lists held permissions.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Permission> {
        if self.all {
            return Permission::ALL.to_vec();
        }
        self.granted.iter().copied().collect()
    }
}

/// Computes the effective permissions of an account.
///
/// Inactive accounts hold nothing. Active superusers hold everything.
/// Otherwise the result is the union of direct and group grants.
#[must_use]
pub fn effective_permissions(
    is_active: bool,
    is_superuser: bool,
    user_permissions: &[Permission],
    group_permissions: &[Permission],
) -> PermissionSet {
    if !is_active {
        return PermissionSet::default();
    }

    if is_superuser {
        return PermissionSet::superuser();
    }

    PermissionSet::from_granted(
        user_permissions
            .iter()
            .chain(group_permissions.iter())
            .copied(),
    )
}
