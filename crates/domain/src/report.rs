// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Builds the title of the next report generated for a mission.
///
/// Reports are numbered from 1 in generation order, so a mission that
/// already has `existing_reports` reports gets number `existing_reports + 1`.
#[must_use]
pub fn next_report_title(mission_name: &str, existing_reports: usize) -> String {
    format!("{mission_name} Report {}", existing_reports.saturating_add(1))
}
