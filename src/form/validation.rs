use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::models::branch::Branch;

// Latin letters plus the Thai block from KO KAI to THAI DIGIT NINE
static LETTERS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\x{0E01}-\x{0E59}]*$").unwrap());
static TEN_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

pub const MSG_LETTERS_ONLY: &str = "letters only";
pub const MSG_TEN_DIGITS: &str = "must be 10 digits";
pub const MSG_SELECT_BRANCH: &str = "please select a branch";
pub const MSG_CHOOSE_ANOTHER_DATE: &str = "please choose another date";
pub const MSG_SLOT_FULL: &str = "this time is fully booked";

/// Inputs of the booking form, named as they are on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "firstName")]
    FirstName,
    #[serde(rename = "lastName")]
    LastName,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "branch")]
    Branch,
    #[serde(rename = "appoint_date")]
    AppointDate,
    /// Held outside the registered set, only checked on submit
    #[serde(rename = "appoint_time")]
    AppointTime,
}

impl Field {
    /// Fields that take free-form input and carry their own rule
    pub const REGISTERED: [Field; 5] = [
        Field::FirstName,
        Field::LastName,
        Field::Phone,
        Field::Branch,
        Field::AppointDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Phone => "phone",
            Field::Branch => "branch",
            Field::AppointDate => "appoint_date",
            Field::AppointTime => "appoint_time",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Empty required input: highlighted, no helper text
    Required,
    Invalid(&'static str),
}

impl Violation {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Violation::Required => None,
            Violation::Invalid(message) => Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub violation: Violation,
}

impl FieldError {
    pub fn new(field: Field, violation: Violation) -> Self {
        Self { field, violation }
    }

    pub fn message(&self) -> Option<&'static str> {
        self.violation.message()
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FieldError", 2)?;
        state.serialize_field("field", &self.field)?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.field, message),
            None => write!(f, "{}: required", self.field),
        }
    }
}

/// Pattern half of the name rule; the empty string matches.
pub fn is_letters_only(value: &str) -> bool {
    LETTERS_ONLY.is_match(value)
}

pub fn is_ten_digits(value: &str) -> bool {
    TEN_DIGITS.is_match(value)
}

pub fn validate_name(value: &str) -> Result<String, Violation> {
    if value.is_empty() {
        return Err(Violation::Required);
    }
    if !is_letters_only(value) {
        return Err(Violation::Invalid(MSG_LETTERS_ONLY));
    }
    Ok(value.to_string())
}

pub fn validate_phone(value: &str) -> Result<String, Violation> {
    if value.is_empty() {
        return Err(Violation::Required);
    }
    if !is_ten_digits(value) {
        return Err(Violation::Invalid(MSG_TEN_DIGITS));
    }
    Ok(value.to_string())
}

/// A select's value: an id, or nothing while the placeholder is shown.
/// Once the branch list is known the id must be one of it.
pub fn validate_branch(value: &str, known: Option<&[Branch]>) -> Result<i64, Violation> {
    let id: i64 = value
        .trim()
        .parse()
        .map_err(|_| Violation::Invalid(MSG_SELECT_BRANCH))?;

    match known {
        Some(branches) if !branches.iter().any(|branch| branch.id == id) => {
            Err(Violation::Invalid(MSG_SELECT_BRANCH))
        }
        _ => Ok(id),
    }
}

pub fn parse_date_input(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// A date input yields UTC midnight of the chosen day, which must lie after `now`.
pub fn validate_appoint_date(value: &str, now: DateTime<Utc>) -> Result<NaiveDate, Violation> {
    if value.trim().is_empty() {
        return Err(Violation::Required);
    }
    let date = parse_date_input(value).ok_or(Violation::Invalid(MSG_CHOOSE_ANOTHER_DATE))?;
    if !is_after(date, now) {
        return Err(Violation::Invalid(MSG_CHOOSE_ANOTHER_DATE));
    }
    Ok(date)
}

pub fn is_after(date: NaiveDate, now: DateTime<Utc>) -> bool {
    date.and_time(chrono::NaiveTime::MIN).and_utc() > now
}
