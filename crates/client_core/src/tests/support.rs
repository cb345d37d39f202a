use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{status, IdentityKey, RecordId},
    protocol::{
        CreateIntakeRequest, CreateIntakeResponse, DeliveryRecord, GeneticTestRecord,
        PostalAddress, ProgressReport, ProgressSummary, SubscriptionRecord, SupplementFeedback,
        WeightProgress, WeightSample,
    },
};
use tokio::sync::Notify;

use crate::CareBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Call {
    CreateIntake,
    GeneticTest,
    Subscription,
    Deliveries,
    ProgressReport,
    RecordWeight,
}

/// In-memory backend with per-call failure injection and an optional hold
/// on intake creation so tests can overlap submissions.
pub(crate) struct ScriptedBackend {
    genetic_test: Option<GeneticTestRecord>,
    subscription: Option<SubscriptionRecord>,
    deliveries: Vec<DeliveryRecord>,
    progress_report: Mutex<ProgressReport>,
    failing: Mutex<HashSet<Call>>,
    calls: Mutex<Vec<Call>>,
    create_requests: Mutex<Vec<CreateIntakeRequest>>,
    hold_create: Option<Arc<Notify>>,
    pub create_entered: Arc<Notify>,
}

impl ScriptedBackend {
    pub(crate) fn populated() -> Self {
        Self {
            genetic_test: Some(sample_genetic_test()),
            subscription: Some(SubscriptionRecord {
                id: Some("sub-1".to_string()),
                status: status::ACTIVE.to_string(),
                monthly_fee: Some(40000.0),
                start_date: None,
                payment_info: None,
            }),
            deliveries: vec![
                sample_delivery("d-2", status::IN_TRANSIT, Some("TRK-2002")),
                sample_delivery("d-1", status::COMPLETED, Some("TRK-1001")),
            ],
            progress_report: Mutex::new(sample_progress_report(72.4, -1.6)),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            create_requests: Mutex::new(Vec::new()),
            hold_create: None,
            create_entered: Arc::new(Notify::new()),
        }
    }

    pub(crate) fn failing(self, call: Call) -> Self {
        self.fail(call);
        self
    }

    pub(crate) fn holding_create(mut self, release: Arc<Notify>) -> Self {
        self.hold_create = Some(release);
        self
    }

    pub(crate) fn fail(&self, call: Call) {
        self.failing.lock().expect("failing lock").insert(call);
    }

    pub(crate) fn recover(&self, call: Call) {
        self.failing.lock().expect("failing lock").remove(&call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn call_count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|made| *made == call).count()
    }

    pub(crate) fn create_requests(&self) -> Vec<CreateIntakeRequest> {
        self.create_requests.lock().expect("requests lock").clone()
    }

    fn enter(&self, call: Call) -> Result<()> {
        self.calls.lock().expect("calls lock").push(call);
        if self.failing.lock().expect("failing lock").contains(&call) {
            return Err(anyhow!("scripted {call:?} failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl CareBackend for ScriptedBackend {
    async fn create_intake(&self, request: CreateIntakeRequest) -> Result<CreateIntakeResponse> {
        self.create_requests
            .lock()
            .expect("requests lock")
            .push(request);
        self.create_entered.notify_one();
        if let Some(release) = &self.hold_create {
            release.notified().await;
        }
        self.enter(Call::CreateIntake)?;
        Ok(CreateIntakeResponse {
            record_id: RecordId::new("test-0001"),
            profile_id: Some("profile-0001".to_string()),
            status: Some("신청완료".to_string()),
            message: None,
        })
    }

    async fn genetic_test(&self, _identity: &IdentityKey) -> Result<Option<GeneticTestRecord>> {
        self.enter(Call::GeneticTest)?;
        Ok(self.genetic_test.clone())
    }

    async fn subscription(&self, _identity: &IdentityKey) -> Result<Option<SubscriptionRecord>> {
        self.enter(Call::Subscription)?;
        Ok(self.subscription.clone())
    }

    async fn deliveries(&self, _identity: &IdentityKey) -> Result<Vec<DeliveryRecord>> {
        self.enter(Call::Deliveries)?;
        Ok(self.deliveries.clone())
    }

    async fn progress_report(&self, _identity: &IdentityKey) -> Result<ProgressReport> {
        self.enter(Call::ProgressReport)?;
        Ok(self.progress_report.lock().expect("report lock").clone())
    }

    async fn record_weight(&self, _identity: &IdentityKey, weight: f64) -> Result<()> {
        self.enter(Call::RecordWeight)?;
        let mut report = self.progress_report.lock().expect("report lock");
        let previous = report.weight_progress.current_weight.unwrap_or(weight);
        report.weight_progress.current_weight = Some(weight);
        report.weight_progress.weight_change =
            Some(report.weight_progress.weight_change.unwrap_or(0.0) + weight - previous);
        report
            .weight_progress
            .history
            .insert(0, WeightSample { weight, date: None });
        let days = report.progress_summary.total_days.unwrap_or(0);
        report.progress_summary.total_days = Some(days + 1);
        Ok(())
    }
}

pub(crate) fn identity() -> IdentityKey {
    IdentityKey::new("demo-user-id")
}

pub(crate) fn sample_genetic_test() -> GeneticTestRecord {
    GeneticTestRecord {
        id: Some("test-0001".to_string()),
        status: status::ANALYSING.to_string(),
        full_name: "Jin Kim".to_string(),
        phone: "010-1234-5678".to_string(),
        email: "jin@example.com".to_string(),
        application_date: None,
        results: None,
    }
}

pub(crate) fn sample_delivery(id: &str, status: &str, tracking: Option<&str>) -> DeliveryRecord {
    DeliveryRecord {
        id: Some(id.to_string()),
        status: status.to_string(),
        address: PostalAddress {
            postal_code: "06236".to_string(),
            address1: "Teheran-ro 123".to_string(),
            address2: "5F".to_string(),
            city: "Seoul".to_string(),
        },
        tracking_number: tracking.map(str::to_string),
        sent_date: None,
        product_list: Vec::new(),
    }
}

pub(crate) fn sample_progress_report(current_weight: f64, weight_change: f64) -> ProgressReport {
    ProgressReport {
        weight_progress: WeightProgress {
            current_weight: Some(current_weight),
            weight_change: Some(weight_change),
            history: vec![WeightSample {
                weight: current_weight,
                date: None,
            }],
        },
        progress_summary: ProgressSummary {
            total_days: Some(1),
            trend: Some("감소".to_string()),
        },
        supplement_feedback: SupplementFeedback {
            average_effectiveness: Some(7.5),
            total_reviews: Some(2),
        },
    }
}
