use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::models::timeslot::TimeSlot;

/// Body of `POST /create`: the validated fields merged with the chosen slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub phone: String,
    pub branch: i64,
    #[serde(serialize_with = "serialize_date_input")]
    pub appoint_date: NaiveDate,
    pub appoint_time: TimeSlot,
}

/// A date input's value as a browser `Date` would send it: UTC midnight with millis.
fn serialize_date_input<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date_input_json(*date))
}

pub fn date_input_json(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00.000Z").to_string()
}

/// First row of a successful `POST /create` response
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedBooking {
    #[serde(default)]
    appoint_date: Value,
}

impl CreatedBooking {
    /// The stored appointment instant, sent back as epoch seconds
    /// (either a JSON number or numeric text, depending on the database driver).
    pub fn appoint_at(&self) -> Option<DateTime<Utc>> {
        let seconds = match &self.appoint_date {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        DateTime::from_timestamp(seconds.trunc() as i64, 0)
    }
}

/// Error payload of a rejected `POST /create`
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamError {
    pub error: Option<String>,
}
