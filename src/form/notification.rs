use chrono::FixedOffset;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::booking::{BookingRequest, CreatedBooking};

pub const TITLE_SAVED: &str = "Booking saved";
pub const TEXT_SAVED: &str = "Your appointment has been recorded, please arrive on time.";
pub const TITLE_NOTICE: &str = "Notice";
pub const TEXT_NOT_SAVED: &str =
    "Your booking could not be saved, please check your details and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// The single alert shown after a submit resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub text: String,
}

impl Notification {
    /// Rich summary when the backend echoed the stored row, plain text otherwise.
    pub fn confirmed(
        request: &BookingRequest,
        branch_name: Option<&str>,
        created: Option<&CreatedBooking>,
        reference: FixedOffset,
    ) -> Self {
        let text = match created.and_then(CreatedBooking::appoint_at) {
            Some(at) => {
                let branch = branch_name
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("branch {}", request.branch));
                format!(
                    "{} {}, {} on {} at {}",
                    request.first_name,
                    request.last_name,
                    branch,
                    at.with_timezone(&reference).format("%-d %B %Y"),
                    request.appoint_time.display(),
                )
            }
            None => TEXT_SAVED.to_string(),
        };

        Self {
            level: Level::Success,
            title: TITLE_SAVED.to_string(),
            text,
        }
    }

    pub fn failed(error: &ApiError) -> Self {
        Self {
            level: Level::Error,
            title: TITLE_NOTICE.to_string(),
            text: error
                .upstream_message()
                .unwrap_or(TEXT_NOT_SAVED)
                .to_string(),
        }
    }
}
