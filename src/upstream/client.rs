use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

use crate::error::ApiError;
use crate::models::booking::{BookingRequest, CreatedBooking, UpstreamError};
use crate::models::branch::Branch;
use crate::models::queue::QueueCount;
use crate::upstream::constants::*;

/// The three endpoints of the booking backend
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn branches(&self) -> Result<Vec<Branch>, ApiError>;

    async fn queue_counts(&self) -> Result<Vec<QueueCount>, ApiError>;

    /// Returns the first created row when the backend echoes one back
    async fn create(&self, request: &BookingRequest) -> Result<Option<CreatedBooking>, ApiError>;
}

/// `reqwest` implementation rooted at the configured API base
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("GET {} failed: {:?}", url, e);
            ApiError::from(e)
        })?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UpstreamError>(&body)
                .ok()
                .and_then(|payload| payload.error);
            warn!("booking backend answered {}: {}", status, body);
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl BookingApi for ApiClient {
    async fn branches(&self) -> Result<Vec<Branch>, ApiError> {
        self.get(BRANCHES_PATH).await
    }

    async fn queue_counts(&self) -> Result<Vec<QueueCount>, ApiError> {
        self.get(CHECK_PATH).await
    }

    async fn create(&self, request: &BookingRequest) -> Result<Option<CreatedBooking>, ApiError> {
        let url = self.endpoint(CREATE_PATH);
        info!(
            "creating booking at branch {} on {} {}",
            request.branch, request.appoint_date, request.appoint_time
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("POST {} failed: {:?}", url, e);
                ApiError::from(e)
            })?;

        let body: Value = Self::handle_response(response).await?;
        Ok(first_created(body))
    }
}

/// Success bodies are an array of created rows; anything else carries no summary.
fn first_created(body: Value) -> Option<CreatedBooking> {
    match body {
        Value::Array(rows) => rows
            .into_iter()
            .next()
            .and_then(|row| serde_json::from_value(row).ok()),
        _ => None,
    }
}
