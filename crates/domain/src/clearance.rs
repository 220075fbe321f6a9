// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Ordinal security clearance attached to employees and missions.
///
/// Stored as its integer level. Clearance is informational: it is recorded
/// on missions and employees but does not filter what a user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityClearance {
    Baseline,
    Confidential,
    Secret,
    TopSecret,
}

impl SecurityClearance {
    /// All clearance levels, lowest first.
    pub const ALL: [Self; 4] = [
        Self::Baseline,
        Self::Confidential,
        Self::Secret,
        Self::TopSecret,
    ];

    /// Converts an integer level (1-4) into a clearance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSecurityClearance` for any other value.
    pub fn from_level<N: ToPrimitive + Copy>(level: N) -> Result<Self, DomainError> {
        match level.to_u8() {
            Some(1) => Ok(Self::Baseline),
            Some(2) => Ok(Self::Confidential),
            Some(3) => Ok(Self::Secret),
            Some(4) => Ok(Self::TopSecret),
            _ => Err(DomainError::InvalidSecurityClearance(
                level.to_i64().unwrap_or(i64::MIN),
            )),
        }
    }

    /// Returns the integer level (1-4).
    #[must_use]
    pub const fn level(self) -> i32 {
        match self {
            Self::Baseline => 1,
            Self::Confidential => 2,
            Self::Secret => 3,
            Self::TopSecret => 4,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Baseline => "Baseline",
            Self::Confidential => "Confidential",
            Self::Secret => "Secret",
            Self::TopSecret => "Top Secret",
        }
    }
}

impl std::fmt::Display for SecurityClearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
