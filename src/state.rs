use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{ReferenceStore, Session, SessionStore};
use crate::config::Config;
use crate::error::FormError;
use crate::form::availability::AvailabilityFilter;
use crate::upstream::client::BookingApi;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared by every worker
pub struct AppState {
    pub references: Arc<ReferenceStore>,
    pub sessions: SessionStore,
    pub filter: AvailabilityFilter,
    pub reference_offset: FixedOffset,
    pub clock: Clock,
}

impl AppState {
    pub fn new(config: &Config, api: Arc<dyn BookingApi>) -> Self {
        Self {
            references: Arc::new(ReferenceStore::new(api, config.revalidate)),
            sessions: SessionStore::new(config.max_sessions, config.session_idle),
            filter: AvailabilityFilter::new(config.slot_capacity, config.reference_offset),
            reference_offset: config.reference_offset,
            clock: Arc::new(Utc::now),
        }
    }

    /// Freezes "now", for tests that validate dates
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub async fn session(&self, id: Uuid) -> Result<Session, FormError> {
        self.sessions
            .get(&id)
            .await
            .ok_or_else(|| FormError::UnknownSession(id.to_string()))
    }
}
