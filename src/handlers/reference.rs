use chrono::NaiveDate;
use std::sync::Arc;

use crate::cache::Reference;
use crate::form::availability::SlotStatus;
use crate::models::branch::Branch;
use crate::state::AppState;

pub async fn get_branches(state: &AppState) -> Reference<Arc<Vec<Branch>>> {
    state.references.revalidate();
    state.references.branches().await
}

/// Slot states for a (branch, date) pair; every slot is open while counts are unknown.
pub async fn get_availability(state: &AppState, branch: i64, date: NaiveDate) -> Vec<SlotStatus> {
    state.references.revalidate();
    let counts = state.references.counts().await;
    state
        .filter
        .compute(counts.loaded().map(|c| c.as_slice()), Some(branch), Some(date))
        .slots()
}
