use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::IdentityKey,
    error::{ApiError, ApiException},
    protocol::{
        CreateIntakeRequest, CreateIntakeResponse, DeliveryRecord, GeneticTestRecord,
        IdentityQuery, ProgressReport, RecordWeightRequest, SubscriptionRecord,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod dashboard;
pub mod error;
pub mod intake;
pub mod status;
pub mod submission;

pub use dashboard::{DashboardAggregator, DashboardKind, ReadSource, ViewModel};
pub use intake::{FieldScope, FormState, StepFormController};
pub use status::{derive_status, StatusCategory};
pub use submission::{Navigation, SubmissionOrchestrator, SubmitOutcome};

const CREATE_INTAKE_PATH: &str = "genetic_service/create_genetic_test";
const GENETIC_TEST_PATH: &str = "genetic_service/get_user_genetic_test";
const SUBSCRIPTION_PATH: &str = "subscription_service/get_user_subscription";
const DELIVERIES_PATH: &str = "subscription_service/get_user_deliveries";
const PROGRESS_REPORT_PATH: &str = "analytics_service/get_user_progress_report";
const RECORD_WEIGHT_PATH: &str = "analytics_service/record_weight";

/// Remote collaborators of the intake and dashboard pipelines.
///
/// Reads return `Ok(None)` when the backend answers `null` for a customer
/// that has no record yet.
#[async_trait]
pub trait CareBackend: Send + Sync {
    async fn create_intake(&self, request: CreateIntakeRequest) -> Result<CreateIntakeResponse>;
    async fn genetic_test(&self, identity: &IdentityKey) -> Result<Option<GeneticTestRecord>>;
    async fn subscription(&self, identity: &IdentityKey) -> Result<Option<SubscriptionRecord>>;
    async fn deliveries(&self, identity: &IdentityKey) -> Result<Vec<DeliveryRecord>>;
    async fn progress_report(&self, identity: &IdentityKey) -> Result<ProgressReport>;
    async fn record_weight(&self, identity: &IdentityKey, weight: f64) -> Result<()>;
}

/// Normalizes a configured backend base URL: trims whitespace and trailing
/// slashes and rejects anything that is not an absolute http(s) URL.
pub fn normalize_backend_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid backend url '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "backend url must use http or https, got '{}'",
            parsed.scheme()
        ));
    }
    Ok(trimmed.to_string())
}

pub struct HttpCareBackend {
    http: Client,
    base_url: String,
}

impl HttpCareBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: normalize_backend_url(base_url)?,
        })
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: normalize_backend_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.post(path, body).await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response body from {path}"))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("malformed response body from {path}"))
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "posting backend request");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {path} failed"))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%url, %status, "backend returned non-success status");
        match serde_json::from_str::<ApiError>(&body) {
            Ok(api_error) => Err(anyhow::Error::new(ApiException::from(api_error))
                .context(format!("{path} returned {status}"))),
            Err(_) => Err(anyhow!("{path} returned {status}")),
        }
    }
}

#[async_trait]
impl CareBackend for HttpCareBackend {
    async fn create_intake(&self, request: CreateIntakeRequest) -> Result<CreateIntakeResponse> {
        self.post_json(CREATE_INTAKE_PATH, &request).await
    }

    async fn genetic_test(&self, identity: &IdentityKey) -> Result<Option<GeneticTestRecord>> {
        self.post_json(GENETIC_TEST_PATH, &identity_query(identity))
            .await
    }

    async fn subscription(&self, identity: &IdentityKey) -> Result<Option<SubscriptionRecord>> {
        self.post_json(SUBSCRIPTION_PATH, &identity_query(identity))
            .await
    }

    async fn deliveries(&self, identity: &IdentityKey) -> Result<Vec<DeliveryRecord>> {
        let deliveries: Option<Vec<DeliveryRecord>> = self
            .post_json(DELIVERIES_PATH, &identity_query(identity))
            .await?;
        Ok(deliveries.unwrap_or_default())
    }

    async fn progress_report(&self, identity: &IdentityKey) -> Result<ProgressReport> {
        self.post_json(PROGRESS_REPORT_PATH, &identity_query(identity))
            .await
    }

    async fn record_weight(&self, identity: &IdentityKey, weight: f64) -> Result<()> {
        let request = RecordWeightRequest {
            identity_key: identity.clone(),
            weight,
        };
        self.post(RECORD_WEIGHT_PATH, &request).await?;
        Ok(())
    }
}

fn identity_query(identity: &IdentityKey) -> IdentityQuery {
    IdentityQuery {
        identity_key: identity.clone(),
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
