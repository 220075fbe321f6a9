// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! Each function performs one write. The `Persistence` adapter pairs writes
//! with their audit event inside a transaction.
//!
//! ## Module Organization
//!
//! - `accounts` - Accounts, group membership, and permission grants
//! - `audit` - Audit event persistence
//! - `directory` - Divisions and employees
//! - `missions` - Missions and mission reports
//! - `sessions` - Login sessions

pub mod accounts;
pub mod audit;
pub mod directory;
pub mod missions;
pub mod sessions;
