use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::models::queue::QueueCount;
use crate::models::timeslot::TimeSlot;

/// Derives which slots of a (branch, date) pair are already full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityFilter {
    capacity: u32,
    reference: FixedOffset,
}

impl AvailabilityFilter {
    pub fn new(capacity: u32, reference: FixedOffset) -> Self {
        Self { capacity, reference }
    }

    /// Counts not loaded yet, or no branch or date chosen, gives an empty map so
    /// every slot stays selectable.
    pub fn compute(
        &self,
        counts: Option<&[QueueCount]>,
        branch: Option<i64>,
        date: Option<NaiveDate>,
    ) -> Availability {
        let (Some(counts), Some(branch), Some(date)) = (counts, branch, date) else {
            return Availability::empty(self.capacity);
        };

        let mut by_slot = BTreeMap::new();

        for row in counts
            .iter()
            .filter(|row| row.branch_id == branch)
            .filter(|row| row.calendar_date(self.reference) == Some(date))
        {
            let Some(slot) = row.slot() else {
                debug!("ignoring count for unknown slot {:?}", row.appoint_time);
                continue;
            };
            let count = row.count().unwrap_or_else(|| {
                warn!(
                    "unreadable count {:?} for branch {} slot {}, treating as 0",
                    row.count, branch, row.appoint_time
                );
                0
            });
            // one row per (branch, date, slot) is expected; a repeat overwrites
            by_slot.insert(slot, count);
        }

        debug!(
            "availability for branch {} on {}: {:?}",
            branch, date, by_slot
        );

        Availability {
            counts: by_slot,
            capacity: self.capacity,
        }
    }
}

/// Existing booking count per slot for one (branch, date) selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    counts: BTreeMap<TimeSlot, u64>,
    capacity: u32,
}

impl Availability {
    pub fn empty(capacity: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            capacity,
        }
    }

    pub fn counts(&self) -> &BTreeMap<TimeSlot, u64> {
        &self.counts
    }

    /// Slots missing from the map count as zero
    pub fn count(&self, slot: TimeSlot) -> u64 {
        self.counts.get(&slot).copied().unwrap_or(0)
    }

    pub fn is_unavailable(&self, slot: TimeSlot) -> bool {
        self.count(slot) >= u64::from(self.capacity)
    }

    /// Every slot with its state, in display order; full slots are disabled, not dropped
    pub fn slots(&self) -> Vec<SlotStatus> {
        TimeSlot::ALL
            .into_iter()
            .map(|slot| SlotStatus {
                slot,
                label: slot.display(),
                count: self.count(slot),
                unavailable: self.is_unavailable(slot),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub slot: TimeSlot,
    pub label: &'static str,
    pub count: u64,
    pub unavailable: bool,
}
