use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One-hour appointment windows offered by every branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSlot {
    /// 12:00 - 13:00
    #[serde(rename = "12")]
    Noon,
    /// 13:00 - 14:00
    #[serde(rename = "13")]
    One,
    /// 14:00 - 15:00
    #[serde(rename = "14")]
    Two,
    /// 15:00 - 16:00
    #[serde(rename = "15")]
    Three,
    /// 16:00 - 17:00
    #[serde(rename = "16")]
    Four,
    /// 17:00 - 18:00
    #[serde(rename = "17")]
    Five,
}

impl TimeSlot {
    /// All slots in the order they are rendered
    pub const ALL: [TimeSlot; 6] = [
        TimeSlot::Noon,
        TimeSlot::One,
        TimeSlot::Two,
        TimeSlot::Three,
        TimeSlot::Four,
        TimeSlot::Five,
    ];

    /// Label used on the wire by `/check` and `/create`
    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Noon => "12",
            TimeSlot::One => "13",
            TimeSlot::Two => "14",
            TimeSlot::Three => "15",
            TimeSlot::Four => "16",
            TimeSlot::Five => "17",
        }
    }

    /// Label shown next to the radio control
    pub fn display(&self) -> &'static str {
        match self {
            TimeSlot::Noon => "12:00",
            TimeSlot::One => "13:00",
            TimeSlot::Two => "14:00",
            TimeSlot::Three => "15:00",
            TimeSlot::Four => "16:00",
            TimeSlot::Five => "17:00",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.label() == label.trim())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time slot {0:?}")]
pub struct UnknownTimeSlot(pub String);

impl FromStr for TimeSlot {
    type Err = UnknownTimeSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownTimeSlot(s.to_string()))
    }
}
