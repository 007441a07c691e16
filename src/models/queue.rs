use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

use crate::models::timeslot::TimeSlot;

/// Existing bookings for one (branch, date, slot) combination, from `GET /check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCount {
    pub branch_id: i64,
    pub appoint_date: String,
    pub appoint_time: String,
    pub count: String, // decimal digits
}

impl QueueCount {
    pub fn slot(&self) -> Option<TimeSlot> {
        TimeSlot::from_label(&self.appoint_time)
    }

    /// Decimal count; a number too large for `u64` saturates instead of failing.
    pub fn count(&self) -> Option<u64> {
        match self.count.trim().parse::<u64>() {
            Ok(count) => Some(count),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u64::MAX),
            Err(_) => None,
        }
    }

    /// Calendar date of the row as seen from the reference timezone
    pub fn calendar_date(&self, reference: FixedOffset) -> Option<NaiveDate> {
        calendar_date(&self.appoint_date, reference)
    }
}

/// Reduces a serialized date to (year, month, day) in the reference timezone.
///
/// Accepts RFC 3339 timestamps (`2023-12-31T17:00:00.000Z`), bare ISO dates
/// (`2024-01-01`) and offset-less timestamps, which are taken as reference-local.
pub fn calendar_date(raw: &str, reference: FixedOffset) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&reference).date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|local| local.date())
}
