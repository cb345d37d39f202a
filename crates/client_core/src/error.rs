//! Failure taxonomy for the intake and dashboard pipelines.
//!
//! None of these are fatal: every variant maps to a state the caller can
//! keep interacting from.

use thiserror::Error;

use crate::dashboard::ReadSource;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("intake flow needs at least one step")]
    NoSteps,
    #[error("step at position {position} has ordinal {ordinal}; ordinals must run 1..=N")]
    OrdinalOutOfSequence { position: usize, ordinal: usize },
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("intake creation request failed: {source}")]
    Remote { source: anyhow::Error },
}

impl SubmissionError {
    /// Retryable notice shown to the customer.
    pub fn user_notice(&self) -> &'static str {
        "상담 신청 중 오류가 발생했습니다. 다시 시도해주세요."
    }
}

#[derive(Debug, Error)]
#[error("{} read failed: {error}", .read.name())]
pub struct AggregationError {
    pub read: ReadSource,
    pub error: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum DataPointError {
    #[error("weight must be a positive number, got {raw:?}")]
    InvalidValue { raw: String },
    #[error("weight write failed: {source}")]
    Write { source: anyhow::Error },
    #[error("weight recorded but progress report refresh failed: {source}")]
    Refresh { source: anyhow::Error },
}
