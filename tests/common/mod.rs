#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use queue_booking::config::Config;
use queue_booking::error::ApiError;
use queue_booking::models::booking::{BookingRequest, CreatedBooking};
use queue_booking::models::branch::Branch;
use queue_booking::models::queue::QueueCount;
use queue_booking::state::AppState;
use queue_booking::upstream::client::BookingApi;

/// In-memory booking backend that records every create call
pub struct FakeBackend {
    pub branches: Vec<Branch>,
    pub counts: Vec<QueueCount>,
    pub reject_with: Option<String>,
    pub created: Mutex<Vec<BookingRequest>>,
    /// When set, create waits for a permit before answering
    pub gate: Option<Arc<Semaphore>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            branches: vec![
                Branch { id: 1, name: "Siam".into() },
                Branch { id: 2, name: "Ari".into() },
            ],
            counts: vec![
                count(1, "2024-01-01", "12", "5"),
                count(2, "2024-01-05", "12", "5"),
                count(2, "2024-01-05", "13", "4"),
            ],
            reject_with: None,
            created: Mutex::new(vec![]),
            gate: None,
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn created(&self) -> Vec<BookingRequest> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingApi for FakeBackend {
    async fn branches(&self) -> Result<Vec<Branch>, ApiError> {
        Ok(self.branches.clone())
    }

    async fn queue_counts(&self) -> Result<Vec<QueueCount>, ApiError> {
        Ok(self.counts.clone())
    }

    async fn create(&self, request: &BookingRequest) -> Result<Option<CreatedBooking>, ApiError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.created.lock().unwrap().push(request.clone());

        match &self.reject_with {
            Some(message) => Err(ApiError::Rejected {
                status: 400,
                message: Some(message.clone()),
            }),
            None => Ok(Some(
                serde_json::from_value(serde_json::json!({ "appoint_date": 1704387600 })).unwrap(),
            )),
        }
    }
}

pub fn count(branch_id: i64, date: &str, time: &str, count: &str) -> QueueCount {
    QueueCount {
        branch_id,
        appoint_date: date.into(),
        appoint_time: time.into(),
        count: count.into(),
    }
}

pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "BOOKING_API" => Some("http://backend.test/api".to_string()),
        _ => None,
    })
    .unwrap()
}

/// App state over `backend` with "now" pinned to 2024-01-01 10:00 Bangkok time
pub fn state(backend: Arc<FakeBackend>) -> web::Data<AppState> {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
    web::Data::new(AppState::new(&config(), backend).with_clock(Arc::new(move || now)))
}
