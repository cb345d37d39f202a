//! Dashboard view-model assembly from the per-customer backend reads.
//!
//! A load issues every read in the dashboard's fixed set concurrently and
//! only produces a view model once all of them have settled. If any read
//! fails the whole pass is discarded in favour of the aggregator's fallback
//! view model; slots are never mixed from real and placeholder data.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{status, IdentityKey},
    protocol::{DeliveryRecord, GeneticTestRecord, ProgressReport, SubscriptionRecord},
};
use tracing::{info, warn};

use crate::{
    error::{AggregationError, DataPointError},
    status::{derive_status, StatusCategory},
    CareBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSource {
    GeneticTest,
    Subscription,
    Deliveries,
    ProgressReport,
}

impl ReadSource {
    pub fn name(&self) -> &'static str {
        match self {
            ReadSource::GeneticTest => "genetic test",
            ReadSource::Subscription => "subscription",
            ReadSource::Deliveries => "delivery history",
            ReadSource::ProgressReport => "progress report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    /// Subscriber dashboard: test, subscription, deliveries and progress.
    Full,
    /// Post-intake consultation status page: the genetic test record only.
    Consultation,
}

impl DashboardKind {
    pub fn sources(self) -> &'static [ReadSource] {
        match self {
            DashboardKind::Full => &[
                ReadSource::GeneticTest,
                ReadSource::Subscription,
                ReadSource::Deliveries,
                ReadSource::ProgressReport,
            ],
            DashboardKind::Consultation => &[ReadSource::GeneticTest],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    pub genetic_test: Option<GeneticTestRecord>,
    pub subscription: Option<SubscriptionRecord>,
    pub deliveries: Option<Vec<DeliveryRecord>>,
    pub progress_report: Option<ProgressReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStatus {
    pub raw: String,
    pub category: StatusCategory,
}

impl DerivedStatus {
    fn from_raw(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            category: derive_status(raw),
        }
    }
}

/// Display-ready values derived from a [`ViewModel`], fallbacks applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub genetic_test: DerivedStatus,
    pub subscription: DerivedStatus,
    pub deliveries: Vec<DerivedStatus>,
    pub current_weight: Option<f64>,
    pub weight_change: Option<f64>,
    pub total_days: u32,
    pub trend: Option<String>,
    pub average_effectiveness: f64,
}

impl ViewModel {
    /// Illustrative record shown on the consultation page when the read fails.
    pub fn consultation_placeholder() -> Self {
        Self {
            genetic_test: Some(GeneticTestRecord {
                id: None,
                status: status::CONSULTATION_REQUESTED.to_string(),
                full_name: "김마이진".to_string(),
                phone: "010-1234-5678".to_string(),
                email: "myjin@example.com".to_string(),
                application_date: None,
                results: None,
            }),
            ..Self::default()
        }
    }

    pub fn genetic_test_status(&self) -> &str {
        self.genetic_test
            .as_ref()
            .map(|test| test.status.as_str())
            .unwrap_or(status::APPLIED)
    }

    pub fn subscription_status(&self) -> &str {
        self.subscription
            .as_ref()
            .map(|subscription| subscription.status.as_str())
            .unwrap_or(status::ACTIVE)
    }

    pub fn deliveries(&self) -> &[DeliveryRecord] {
        self.deliveries.as_deref().unwrap_or_default()
    }

    pub fn latest_delivery(&self) -> Option<&DeliveryRecord> {
        self.deliveries().first()
    }

    pub fn current_weight(&self) -> Option<f64> {
        self.progress_report
            .as_ref()
            .and_then(|report| report.weight_progress.current_weight)
    }

    pub fn weight_change(&self) -> Option<f64> {
        self.progress_report
            .as_ref()
            .and_then(|report| report.weight_progress.weight_change)
    }

    pub fn total_days(&self) -> u32 {
        self.progress_report
            .as_ref()
            .and_then(|report| report.progress_summary.total_days)
            .unwrap_or(0)
    }

    pub fn trend(&self) -> Option<&str> {
        self.progress_report
            .as_ref()
            .and_then(|report| report.progress_summary.trend.as_deref())
    }

    pub fn average_effectiveness(&self) -> f64 {
        self.progress_report
            .as_ref()
            .and_then(|report| report.supplement_feedback.average_effectiveness)
            .unwrap_or(0.0)
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            genetic_test: DerivedStatus::from_raw(self.genetic_test_status()),
            subscription: DerivedStatus::from_raw(self.subscription_status()),
            deliveries: self
                .deliveries()
                .iter()
                .map(|delivery| DerivedStatus::from_raw(&delivery.status))
                .collect(),
            current_weight: self.current_weight(),
            weight_change: self.weight_change(),
            total_days: self.total_days(),
            trend: self.trend().map(str::to_string),
            average_effectiveness: self.average_effectiveness(),
        }
    }
}

/// Parses the free-text weight entry. Empty, non-numeric, non-finite and
/// non-positive inputs are rejected before any write is attempted.
pub fn parse_weight_input(raw: &str) -> Result<f64, DataPointError> {
    let invalid = || DataPointError::InvalidValue {
        raw: raw.to_string(),
    };
    let weight: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !weight.is_finite() || weight <= 0.0 {
        return Err(invalid());
    }
    Ok(weight)
}

pub struct DashboardAggregator {
    backend: Arc<dyn CareBackend>,
    kind: DashboardKind,
    fallback: ViewModel,
}

impl DashboardAggregator {
    pub fn new(backend: Arc<dyn CareBackend>, kind: DashboardKind, fallback: ViewModel) -> Self {
        Self {
            backend,
            kind,
            fallback,
        }
    }

    /// Subscriber dashboard falling back to an empty view model.
    pub fn full(backend: Arc<dyn CareBackend>) -> Self {
        Self::new(backend, DashboardKind::Full, ViewModel::default())
    }

    /// Consultation page falling back to the illustrative placeholder record.
    pub fn consultation(backend: Arc<dyn CareBackend>) -> Self {
        Self::new(
            backend,
            DashboardKind::Consultation,
            ViewModel::consultation_placeholder(),
        )
    }

    pub fn kind(&self) -> DashboardKind {
        self.kind
    }

    pub fn fallback(&self) -> &ViewModel {
        &self.fallback
    }

    pub async fn load(&self, identity: &IdentityKey) -> ViewModel {
        match self.try_load(identity).await {
            Ok(view_model) => {
                info!(
                    %identity,
                    kind = ?self.kind,
                    reads = self.kind.sources().len(),
                    "dashboard loaded"
                );
                view_model
            }
            Err(err) => {
                warn!(
                    %identity,
                    kind = ?self.kind,
                    read = err.read.name(),
                    error = %format!("{:#}", err.error),
                    "dashboard read failed; using fallback view model"
                );
                self.fallback.clone()
            }
        }
    }

    pub async fn try_load(&self, identity: &IdentityKey) -> Result<ViewModel, AggregationError> {
        let backend = self.backend.as_ref();
        match self.kind {
            DashboardKind::Full => {
                let (genetic_test, subscription, deliveries, progress_report) = futures::join!(
                    backend.genetic_test(identity),
                    backend.subscription(identity),
                    backend.deliveries(identity),
                    backend.progress_report(identity),
                );
                Ok(ViewModel {
                    genetic_test: settle(ReadSource::GeneticTest, genetic_test)?,
                    subscription: settle(ReadSource::Subscription, subscription)?,
                    deliveries: Some(settle(ReadSource::Deliveries, deliveries)?),
                    progress_report: Some(settle(ReadSource::ProgressReport, progress_report)?),
                })
            }
            DashboardKind::Consultation => {
                let genetic_test = backend.genetic_test(identity).await;
                Ok(ViewModel {
                    genetic_test: settle(ReadSource::GeneticTest, genetic_test)?,
                    ..ViewModel::default()
                })
            }
        }
    }

    /// Records a weight entry and refreshes the progress-report slot only.
    /// On failure `current` is left as it was and the error is returned.
    pub async fn record_data_point(
        &self,
        identity: &IdentityKey,
        weight: f64,
        current: &ViewModel,
    ) -> Result<ViewModel, DataPointError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(DataPointError::InvalidValue {
                raw: weight.to_string(),
            });
        }

        if let Err(source) = self.backend.record_weight(identity, weight).await {
            warn!(%identity, weight, error = %format!("{source:#}"), "weight write failed");
            return Err(DataPointError::Write { source });
        }

        let progress_report = match self.backend.progress_report(identity).await {
            Ok(report) => report,
            Err(source) => {
                warn!(%identity, error = %format!("{source:#}"), "progress report refresh failed");
                return Err(DataPointError::Refresh { source });
            }
        };

        info!(%identity, weight, "weight recorded");
        Ok(ViewModel {
            progress_report: Some(progress_report),
            ..current.clone()
        })
    }
}

fn settle<T>(read: ReadSource, result: anyhow::Result<T>) -> Result<T, AggregationError> {
    result.map_err(|error| AggregationError { read, error })
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
