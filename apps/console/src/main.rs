use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    dashboard::{parse_weight_input, DashboardSummary},
    intake::{FieldScope, StepFormController},
    CareBackend, DashboardAggregator, HttpCareBackend, Navigation, SubmissionOrchestrator,
    SubmitOutcome, ViewModel,
};
use serde::Serialize;
use shared::domain::{agreements, fields, IdentityKey};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "console", about = "Consultation intake and customer dashboard client")]
struct Args {
    /// Overrides the configured backend base URL.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    /// Overrides the configured customer identity key.
    #[arg(long, global = true)]
    identity_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the two-step consultation intake and submit it.
    Intake {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        accept_privacy: bool,
        #[arg(long)]
        accept_terms: bool,
        #[arg(long)]
        accept_genetic_test: bool,
    },
    /// Load and print a dashboard view model.
    Dashboard {
        /// Load the consultation status page instead of the subscriber dashboard.
        #[arg(long)]
        consultation: bool,
    },
    /// Record a weight entry and print the refreshed dashboard.
    RecordWeight { weight: String },
}

const SUBMITTED_BANNER: &str = "상담 신청이 완료되었습니다!";

#[derive(Debug, Serialize)]
struct DashboardOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    banner: Option<&'static str>,
    summary: DashboardSummary,
    view_model: ViewModel,
}

impl DashboardOutput {
    fn new(view_model: ViewModel, banner: Option<&'static str>) -> Self {
        Self {
            banner,
            summary: view_model.summary(),
            view_model,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.backend_url {
        settings.backend_url = url;
    }
    if let Some(key) = args.identity_key {
        settings.identity_key = key;
    }

    let backend = build_backend(&settings)?;
    let identity = IdentityKey::new(settings.identity_key.clone());
    info!(backend_url = %backend.base_url(), %identity, "console starting");
    let backend: Arc<dyn CareBackend> = backend;

    match args.command {
        Command::Intake {
            full_name,
            phone,
            email,
            accept_privacy,
            accept_terms,
            accept_genetic_test,
        } => {
            let output = run_intake(
                backend,
                &identity,
                [full_name, phone, email],
                [accept_genetic_test, accept_privacy, accept_terms],
            )
            .await?;
            print_json(&output)
        }
        Command::Dashboard { consultation } => {
            let aggregator = if consultation {
                DashboardAggregator::consultation(backend)
            } else {
                DashboardAggregator::full(backend)
            };
            let view_model = aggregator.load(&identity).await;
            print_json(&DashboardOutput::new(view_model, None))
        }
        Command::RecordWeight { weight } => {
            let weight = parse_weight_input(&weight)?;
            let aggregator = DashboardAggregator::full(backend);
            let current = aggregator.load(&identity).await;
            let refreshed = aggregator
                .record_data_point(&identity, weight, &current)
                .await?;
            print_json(&DashboardOutput::new(refreshed, None))
        }
    }
}

fn build_backend(settings: &Settings) -> Result<Arc<HttpCareBackend>> {
    let backend = match settings.request_timeout_secs {
        Some(secs) => {
            HttpCareBackend::with_timeout(&settings.backend_url, Duration::from_secs(secs))
        }
        None => HttpCareBackend::new(&settings.backend_url),
    }
    .context("failed to configure backend client")?;
    Ok(Arc::new(backend))
}

async fn run_intake(
    backend: Arc<dyn CareBackend>,
    identity: &IdentityKey,
    identity_values: [String; 3],
    agreement_values: [bool; 3],
) -> Result<DashboardOutput> {
    let controller = StepFormController::consultation();
    let mut state = controller.initial_state();

    for (name, value) in fields::IDENTITY.iter().zip(identity_values) {
        state = state.update_field(FieldScope::Identity, name, value);
    }
    if !controller.can_advance(&state) {
        bail!("personal information is incomplete: full name, phone and email are required");
    }
    state = controller.advance(&state);

    for (name, accepted) in agreements::ALL.iter().zip(agreement_values) {
        state = state.update_field(FieldScope::Agreements, name, accepted);
    }
    if !controller.can_submit(&state) {
        bail!("the privacy agreement must be accepted (--accept-privacy)");
    }

    let orchestrator = SubmissionOrchestrator::new(backend.clone());
    let outcome = orchestrator.submit(&controller, &state).await;
    match outcome.navigation() {
        Navigation::ConsultationStatus {
            record_id,
            just_submitted,
        } => {
            info!(%record_id, "navigating to consultation status");
            let view_model = DashboardAggregator::consultation(backend)
                .load(identity)
                .await;
            Ok(DashboardOutput::new(
                view_model,
                just_submitted.then_some(SUBMITTED_BANNER),
            ))
        }
        Navigation::StayOnFinalStep { notice } => match outcome {
            SubmitOutcome::Failed(err) => {
                bail!("{} ({err})", notice.unwrap_or_default())
            }
            other => bail!("submission was not sent: {other:?}"),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
