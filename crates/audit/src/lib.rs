// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

#[cfg(test)]
mod tests;

/// Represents the account performing an action.
///
/// `user_id` is `None` only for actions taken before any account exists
/// (bootstrap) or for failed logins attributed to a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The acting account, if known.
    pub user_id: Option<i64>,
    /// The username as presented at the time of the action.
    pub username: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The acting account, if known
    /// * `username` - The username of the actor
    #[must_use]
    pub const fn new(user_id: Option<i64>, username: String) -> Self {
        Self { user_id, username }
    }

    /// The actor used for actions no account performed.
    #[must_use]
    pub fn system() -> Self {
        Self {
            user_id: None,
            username: String::from("system"),
        }
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request path).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`CreateMission`", "`GenerateReport`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The kind of record an action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Mission,
    MissionReport,
    Session,
    Account,
    Division,
    Employee,
}

impl TargetKind {
    /// Returns the stored name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::MissionReport => "mission_report",
            Self::Session => "session",
            Self::Account => "account",
            Self::Division => "division",
            Self::Employee => "employee",
        }
    }

    /// Parses a stored kind name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mission" => Some(Self::Mission),
            "mission_report" => Some(Self::MissionReport),
            "session" => Some(Self::Session),
            "account" => Some(Self::Account),
            "division" => Some(Self::Division),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record an action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuditTarget {
    pub kind: TargetKind,
    pub id: i64,
}

impl AuditTarget {
    #[must_use]
    pub const fn new(kind: TargetKind, id: i64) -> Self {
        Self { kind, id }
    }

    #[must_use]
    pub const fn mission(id: i64) -> Self {
        Self::new(TargetKind::Mission, id)
    }

    #[must_use]
    pub const fn mission_report(id: i64) -> Self {
        Self::new(TargetKind::MissionReport, id)
    }
}

/// A snapshot of a record at a point in time.
///
/// Holds a compact textual rendering of the fields that changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateSnapshot {
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }

    /// A snapshot for a record that does not exist (before create, after delete).
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// Returns whether this snapshot describes a missing record.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.data.is_empty()
    }
}

/// An immutable audit event representing a state change.
///
/// Every successful mutation produces exactly one audit event capturing:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - The record it touched (target), if any
/// - The record before and after the change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The persisted identifier; `None` until stored.
    pub event_id: Option<i64>,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub target: Option<AuditTarget>,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates a new, not yet persisted `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `target` - The record the action touched
    /// * `before` - The record before the change
    /// * `after` - The record after the change
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        target: Option<AuditTarget>,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            target,
            before,
            after,
        }
    }

    /// Returns a copy carrying the persisted identifier.
    #[must_use]
    pub fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}
