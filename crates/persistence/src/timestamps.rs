// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Timestamps are stored as RFC 3339 text in UTC with whole seconds, so
//! stored values sort chronologically.

use missions_domain::format_datetime;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::error::PersistenceError;

pub fn to_text(value: OffsetDateTime) -> Result<String, PersistenceError> {
    let normalized: OffsetDateTime = value
        .to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .map_err(|e| PersistenceError::Other(e.to_string()))?;
    format_datetime(normalized).map_err(|e| PersistenceError::Other(e.to_string()))
}

pub fn now_text() -> Result<String, PersistenceError> {
    to_text(OffsetDateTime::now_utc())
}

pub fn from_text(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::CorruptRecord(format!("timestamp '{value}': {e}")))
}

pub fn optional_to_text(value: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    value.map(to_text).transpose()
}

pub fn optional_from_text(value: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(from_text).transpose()
}
