use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::{ApiError, FormError};
use crate::form::availability::{Availability, AvailabilityFilter};
use crate::form::notification::Notification;
use crate::form::validation::*;
use crate::models::booking::{BookingRequest, CreatedBooking};
use crate::models::branch::{Branch, branch_name};
use crate::models::queue::QueueCount;
use crate::models::timeslot::TimeSlot;
use crate::upstream::client::BookingApi;

/// What validation may consult besides the raw values
#[derive(Debug, Clone, Copy)]
pub struct FormContext<'a> {
    pub now: DateTime<Utc>,
    pub branches: Option<&'a [Branch]>,
    pub availability: Option<&'a Availability>,
    pub reference: FixedOffset,
}

/// State of one booking form.
///
/// The five registered fields keep their raw text and are checked by their own
/// rule. The time slot is a separate piece of state chosen from a radio group and
/// only merged into the request when it is assembled for submit.
#[derive(Debug, Default, Clone)]
pub struct FormController {
    values: BTreeMap<Field, String>,
    time: Option<TimeSlot>,
    errors: BTreeMap<Field, FieldError>,
    submit_count: u32,
    submitting: bool,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn time(&self) -> Option<TimeSlot> {
        self.time
    }

    pub fn errors(&self) -> Vec<FieldError> {
        self.errors.values().copied().collect()
    }

    pub fn error(&self, field: Field) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    /// Records a keystroke or selection. Until the first submit attempt this only
    /// stores the value; afterwards the field is re-validated on every change.
    pub fn set_field(
        &mut self,
        field: Field,
        value: impl Into<String>,
        ctx: &FormContext<'_>,
    ) -> Result<(), FormError> {
        if field == Field::AppointTime {
            return Err(FormError::NotRegistered(field));
        }
        self.values.insert(field, value.into());
        if self.submit_count > 0 {
            self.validate_field(field, ctx);
        }
        Ok(())
    }

    /// Leaving a field validates it.
    pub fn blur(&mut self, field: Field, ctx: &FormContext<'_>) -> Option<FieldError> {
        self.validate_field(field, ctx)
    }

    /// Chooses a slot, or clears it with `None`. Full slots are disabled controls,
    /// so choosing one is refused.
    pub fn select_time(
        &mut self,
        slot: Option<TimeSlot>,
        availability: &Availability,
    ) -> Result<(), FormError> {
        if let Some(slot) = slot {
            if availability.is_unavailable(slot) {
                return Err(FormError::SlotUnavailable(slot.label().to_string()));
            }
            self.errors.remove(&Field::AppointTime);
        }
        self.time = slot;
        Ok(())
    }

    /// Branch as currently selected, without judging it
    pub fn selected_branch(&self) -> Option<i64> {
        self.value(Field::Branch).trim().parse().ok()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        parse_date_input(self.value(Field::AppointDate))
    }

    /// Slot counts for the current (branch, date) selection
    pub fn availability(
        &self,
        filter: &AvailabilityFilter,
        counts: Option<&[QueueCount]>,
    ) -> Availability {
        filter.compute(counts, self.selected_branch(), self.selected_date())
    }

    fn validate_field(&mut self, field: Field, ctx: &FormContext<'_>) -> Option<FieldError> {
        let outcome = match field {
            Field::FirstName | Field::LastName => validate_name(self.value(field)).map(drop),
            Field::Phone => validate_phone(self.value(field)).map(drop),
            Field::Branch => validate_branch(self.value(field), ctx.branches).map(drop),
            Field::AppointDate => validate_appoint_date(self.value(field), ctx.now).map(drop),
            Field::AppointTime => self.check_time(ctx).map(drop),
        };

        match outcome {
            Ok(()) => {
                self.errors.remove(&field);
                None
            }
            Err(violation) => {
                let error = FieldError::new(field, violation);
                self.errors.insert(field, error);
                Some(error)
            }
        }
    }

    fn check_time(&self, ctx: &FormContext<'_>) -> Result<TimeSlot, Violation> {
        let slot = self.time.ok_or(Violation::Required)?;
        match ctx.availability {
            Some(availability) if availability.is_unavailable(slot) => {
                Err(Violation::Invalid(MSG_SLOT_FULL))
            }
            _ => Ok(slot),
        }
    }

    /// Runs every rule and assembles the request when all pass.
    pub fn validate(&mut self, ctx: &FormContext<'_>) -> Result<BookingRequest, Vec<FieldError>> {
        for field in Field::REGISTERED {
            self.validate_field(field, ctx);
        }
        self.validate_field(Field::AppointTime, ctx);

        if !self.errors.is_empty() {
            return Err(self.errors());
        }

        let (Ok(branch), Ok(appoint_date), Ok(appoint_time)) = (
            validate_branch(self.value(Field::Branch), ctx.branches),
            validate_appoint_date(self.value(Field::AppointDate), ctx.now),
            self.check_time(ctx),
        ) else {
            return Err(self.errors());
        };

        Ok(BookingRequest {
            first_name: self.value(Field::FirstName).to_string(),
            last_name: self.value(Field::LastName).to_string(),
            phone: self.value(Field::Phone).to_string(),
            branch,
            appoint_date,
            appoint_time,
        })
    }

    /// First half of a submit: validates and marks the form as in flight.
    /// A second call before [`finish_submit`](Self::finish_submit) is refused.
    pub fn begin_submit(&mut self, ctx: &FormContext<'_>) -> Result<BookingRequest, FormError> {
        if self.submitting {
            return Err(FormError::AlreadySubmitting);
        }
        self.submit_count += 1;

        let request = self.validate(ctx).map_err(FormError::Invalid)?;
        self.submitting = true;
        Ok(request)
    }

    /// Second half of a submit: success clears the form, failure keeps every value
    /// so the user can correct and retry.
    pub fn finish_submit(
        &mut self,
        request: &BookingRequest,
        outcome: Result<Option<CreatedBooking>, ApiError>,
        ctx: &FormContext<'_>,
    ) -> Notification {
        self.submitting = false;

        match outcome {
            Ok(created) => {
                info!(
                    "booking saved for branch {} on {} {}",
                    request.branch, request.appoint_date, request.appoint_time
                );
                let name = ctx.branches.and_then(|b| branch_name(b, request.branch));
                let notification =
                    Notification::confirmed(request, name, created.as_ref(), ctx.reference);
                self.reset();
                notification
            }
            Err(e) => {
                warn!("booking was not saved: {}", e);
                Notification::failed(&e)
            }
        }
    }

    /// Releases the in-flight guard when the outcome of a submit will never arrive.
    /// Values are kept so the user can retry.
    pub fn abandon_submit(&mut self) {
        if self.submitting {
            warn!("submission abandoned before its outcome was applied");
            self.submitting = false;
        }
    }

    /// Validates, sends exactly one create request, and applies its outcome.
    pub async fn submit<A>(&mut self, api: &A, ctx: &FormContext<'_>) -> Result<Notification, FormError>
    where
        A: BookingApi + ?Sized,
    {
        let request = self.begin_submit(ctx)?;
        // `&mut self` already serialises this call; dropping the future must not leave the form locked
        self.submitting = false;
        let outcome = api.create(&request).await;
        Ok(self.finish_submit(&request, outcome, ctx))
    }

    /// Back to an empty form
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            values: Field::REGISTERED
                .into_iter()
                .map(|field| (field, self.value(field).to_string()))
                .collect(),
            appoint_time: self.time,
            errors: self.errors(),
            submitting: self.submitting,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub values: BTreeMap<Field, String>,
    pub appoint_time: Option<TimeSlot>,
    pub errors: Vec<FieldError>,
    pub submitting: bool,
}
