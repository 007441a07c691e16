use moka::future::Cache;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::form::controller::FormController;
use crate::models::branch::Branch;
use crate::models::queue::QueueCount;
use crate::upstream::client::BookingApi;
use crate::upstream::constants::{BRANCHES_KEY, CHECK_KEY};

/// Fetch state of one reference endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Reference<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Reference<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Reference::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Reference::Loaded(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reference<U> {
        match self {
            Reference::Loading => Reference::Loading,
            Reference::Loaded(value) => Reference::Loaded(f(value)),
            Reference::Failed(reason) => Reference::Failed(reason),
        }
    }
}

/// Branch and booking-count lists, kept for `ttl` and then fetched again.
/// Failures are remembered separately and never cached as data.
pub struct ReferenceStore {
    api: Arc<dyn BookingApi>,
    branches: Cache<&'static str, Arc<Vec<Branch>>>,
    counts: Cache<&'static str, Arc<Vec<QueueCount>>>,
    failures: Cache<&'static str, String>,
}

impl ReferenceStore {
    pub fn new(api: Arc<dyn BookingApi>, ttl: Duration) -> Self {
        Self {
            api,
            branches: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            counts: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            failures: Cache::builder().max_capacity(2).build(),
        }
    }

    pub fn api(&self) -> Arc<dyn BookingApi> {
        Arc::clone(&self.api)
    }

    pub async fn branches(&self) -> Reference<Arc<Vec<Branch>>> {
        state(&self.branches, &self.failures, BRANCHES_KEY).await
    }

    pub async fn counts(&self) -> Reference<Arc<Vec<QueueCount>>> {
        state(&self.counts, &self.failures, CHECK_KEY).await
    }

    pub async fn load_branches(&self) -> Reference<Arc<Vec<Branch>>> {
        let api = Arc::clone(&self.api);
        load(&self.branches, &self.failures, BRANCHES_KEY, async move {
            api.branches().await
        })
        .await
    }

    pub async fn load_counts(&self) -> Reference<Arc<Vec<QueueCount>>> {
        let api = Arc::clone(&self.api);
        load(&self.counts, &self.failures, CHECK_KEY, async move {
            api.queue_counts().await
        })
        .await
    }

    /// Drops the count list so the next reader refetches it, e.g. after a booking.
    pub async fn invalidate_counts(&self) {
        self.counts.invalidate(&CHECK_KEY).await;
    }

    /// Fetches both lists concurrently.
    pub async fn refresh(&self) {
        let (branches, counts) = tokio::join!(self.load_branches(), self.load_counts());
        info!(
            "reference data refreshed: branches loaded={}, counts loaded={}",
            branches.is_loaded(),
            counts.is_loaded()
        );
    }

    /// Starts a background fetch for whichever list is missing or expired, so
    /// readers see `loading` instead of waiting on the backend.
    pub fn revalidate(self: &Arc<Self>) {
        if !self.branches.contains_key(&BRANCHES_KEY) {
            let store = Arc::clone(self);
            tokio::spawn(async move {
                store.load_branches().await;
            });
        }
        if !self.counts.contains_key(&CHECK_KEY) {
            let store = Arc::clone(self);
            tokio::spawn(async move {
                store.load_counts().await;
            });
        }
    }
}

async fn state<T>(
    cache: &Cache<&'static str, Arc<T>>,
    failures: &Cache<&'static str, String>,
    key: &'static str,
) -> Reference<Arc<T>>
where
    T: Send + Sync + 'static,
{
    if let Some(value) = cache.get(&key).await {
        return Reference::Loaded(value);
    }
    match failures.get(&key).await {
        Some(reason) => Reference::Failed(reason),
        None => Reference::Loading,
    }
}

async fn load<T, F>(
    cache: &Cache<&'static str, Arc<T>>,
    failures: &Cache<&'static str, String>,
    key: &'static str,
    fetch: F,
) -> Reference<Arc<T>>
where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, ApiError>>,
{
    match cache.try_get_with(key, async { fetch.await.map(Arc::new) }).await {
        Ok(value) => {
            failures.invalidate(&key).await;
            Reference::Loaded(value)
        }
        Err(e) => {
            error!("failed to load {}: {}", key, e);
            failures.insert(key, e.to_string()).await;
            Reference::Failed(e.to_string())
        }
    }
}

pub type Session = Arc<Mutex<FormController>>;

/// Open booking forms, dropped after sitting idle
pub struct SessionStore {
    sessions: Cache<Uuid, Session>,
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle)
                .build(),
        }
    }

    pub async fn open(&self) -> (Uuid, Session) {
        let id = Uuid::new_v4();
        let session: Session = Arc::new(Mutex::new(FormController::new()));
        self.sessions.insert(id, Arc::clone(&session)).await;
        (id, session)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.get(id).await
    }

    pub async fn close(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).await.is_some()
    }
}
