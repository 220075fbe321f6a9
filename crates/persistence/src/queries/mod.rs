// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! ## Module Organization
//!
//! - `accounts` - Accounts, group membership, and permission grants
//! - `audit` - Audit log
//! - `directory` - Divisions and employees
//! - `missions` - Missions and mission reports
//! - `sessions` - Login sessions

pub mod accounts;
pub mod audit;
pub mod directory;
pub mod missions;
pub mod sessions;

pub use audit::StoredAuditEvent;
