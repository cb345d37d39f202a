//! One-shot submission of a completed intake form.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::{
    domain::{IdentityToken, RecordId},
    protocol::{CreateIntakeRequest, PostalAddress},
};
use tracing::{debug, info, warn};

use crate::{
    error::SubmissionError,
    intake::{FormState, StepFormController},
    CareBackend,
};

#[derive(Debug)]
pub enum SubmitOutcome {
    Created {
        record_id: RecordId,
        identity_token: IdentityToken,
        just_submitted: bool,
    },
    Failed(SubmissionError),
    /// The form is not on its final step or the final gate is closed.
    Rejected,
    /// Another submission is still awaiting the backend.
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    ConsultationStatus {
        record_id: RecordId,
        just_submitted: bool,
    },
    StayOnFinalStep {
        notice: Option<&'static str>,
    },
}

impl SubmitOutcome {
    pub fn navigation(&self) -> Navigation {
        match self {
            SubmitOutcome::Created {
                record_id,
                just_submitted,
                ..
            } => Navigation::ConsultationStatus {
                record_id: record_id.clone(),
                just_submitted: *just_submitted,
            },
            SubmitOutcome::Failed(err) => Navigation::StayOnFinalStep {
                notice: Some(err.user_notice()),
            },
            SubmitOutcome::Rejected | SubmitOutcome::InFlight => {
                Navigation::StayOnFinalStep { notice: None }
            }
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, SubmitOutcome::Created { .. })
    }
}

/// Releases the in-flight flag on every exit path, including a dropped future.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SubmissionOrchestrator {
    backend: Arc<dyn CareBackend>,
    in_flight: AtomicBool,
}

impl SubmissionOrchestrator {
    pub fn new(backend: Arc<dyn CareBackend>) -> Self {
        Self {
            backend,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(&self, controller: &StepFormController, state: &FormState) -> SubmitOutcome {
        let Some(details) = controller.finalize(state) else {
            debug!(
                current_step = state.current_step(),
                "submit ignored: final gate not satisfied"
            );
            return SubmitOutcome::Rejected;
        };

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            info!("submit suppressed: previous submission still in flight");
            return SubmitOutcome::InFlight;
        };

        let identity_token = IdentityToken::generate();
        let request = CreateIntakeRequest {
            identity_token,
            full_name: details.full_name,
            phone: details.phone,
            email: details.email,
            address: PostalAddress::default(),
        };

        match self.backend.create_intake(request).await {
            Ok(response) => {
                info!(
                    record_id = %response.record_id,
                    %identity_token,
                    "consultation intake created"
                );
                SubmitOutcome::Created {
                    record_id: response.record_id,
                    identity_token,
                    just_submitted: true,
                }
            }
            Err(source) => {
                warn!(error = %format!("{source:#}"), "consultation intake submission failed");
                SubmitOutcome::Failed(SubmissionError::Remote { source })
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
