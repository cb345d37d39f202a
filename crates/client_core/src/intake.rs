//! Step-form controller for the consultation intake flow.
//!
//! [`FormState`] is an immutable value; every transition returns a new state
//! and gates are re-evaluated from the latest field values on each call.

use std::collections::BTreeMap;

use shared::domain::{agreements, fields};
use tracing::warn;

use crate::error::IntakeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    Identity,
    Agreements,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Checked(_) => "checked",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Checked(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    current_step: usize,
    fields: BTreeMap<String, String>,
    agreements: BTreeMap<String, bool>,
}

impl FormState {
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn agreement(&self, name: &str) -> bool {
        self.agreements.get(name).copied().unwrap_or(false)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn agreements(&self) -> &BTreeMap<String, bool> {
        &self.agreements
    }

    /// Returns a copy with one value replaced. A text value aimed at the
    /// agreement scope (or a flag aimed at the identity scope) is ignored.
    pub fn update_field(
        &self,
        scope: FieldScope,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> FormState {
        let mut next = self.clone();
        match (scope, value.into()) {
            (FieldScope::Identity, FieldValue::Text(text)) => {
                next.fields.insert(name.to_string(), text);
            }
            (FieldScope::Agreements, FieldValue::Checked(checked)) => {
                next.agreements.insert(name.to_string(), checked);
            }
            (scope, value) => {
                warn!(
                    ?scope,
                    field = name,
                    kind = value.kind(),
                    "ignoring mismatched intake field update"
                );
            }
        }
        next
    }

    fn with_step(&self, current_step: usize) -> FormState {
        FormState {
            current_step,
            ..self.clone()
        }
    }
}

/// Admission predicate evaluated against a [`FormState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Every named text field is non-empty.
    FieldsFilled(&'static [&'static str]),
    /// The named agreement is checked.
    AgreementAccepted(&'static str),
}

impl Gate {
    pub fn evaluate(&self, state: &FormState) -> bool {
        match self {
            Gate::FieldsFilled(names) => names
                .iter()
                .all(|name| !state.field(name).is_empty()),
            Gate::AgreementAccepted(name) => state.agreement(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub ordinal: usize,
    pub label: &'static str,
    pub gate: Gate,
}

pub const CONSULTATION_STEPS: &[StepDefinition] = &[
    StepDefinition {
        ordinal: 1,
        label: "개인정보",
        gate: Gate::FieldsFilled(fields::IDENTITY),
    },
    StepDefinition {
        ordinal: 2,
        label: "동의서",
        gate: Gate::AgreementAccepted(agreements::PRIVACY),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepProgress {
    Completed,
    Active,
    Upcoming,
}

/// Identity and contact values handed to submission once the form is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeDetails {
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct StepFormController {
    steps: Vec<StepDefinition>,
}

impl StepFormController {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, IntakeError> {
        if steps.is_empty() {
            return Err(IntakeError::NoSteps);
        }
        for (index, step) in steps.iter().enumerate() {
            if step.ordinal != index + 1 {
                return Err(IntakeError::OrdinalOutOfSequence {
                    position: index,
                    ordinal: step.ordinal,
                });
            }
        }
        Ok(Self { steps })
    }

    /// The reference two-step flow: personal information, then consent.
    pub fn consultation() -> Self {
        Self {
            steps: CONSULTATION_STEPS.to_vec(),
        }
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn initial_state(&self) -> FormState {
        let mut state = FormState {
            current_step: 1,
            fields: fields::IDENTITY
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
            agreements: agreements::ALL
                .iter()
                .map(|name| (name.to_string(), false))
                .collect(),
        };
        for step in &self.steps {
            match step.gate {
                Gate::FieldsFilled(names) => {
                    for name in names {
                        state.fields.entry(name.to_string()).or_default();
                    }
                }
                Gate::AgreementAccepted(name) => {
                    state.agreements.entry(name.to_string()).or_insert(false);
                }
            }
        }
        state
    }

    pub fn current_definition(&self, state: &FormState) -> Option<&StepDefinition> {
        state
            .current_step
            .checked_sub(1)
            .and_then(|index| self.steps.get(index))
    }

    pub fn can_advance(&self, state: &FormState) -> bool {
        self.current_definition(state)
            .is_some_and(|step| step.gate.evaluate(state))
    }

    pub fn advance(&self, state: &FormState) -> FormState {
        if state.current_step < self.step_count() && self.can_advance(state) {
            state.with_step(state.current_step + 1)
        } else {
            state.clone()
        }
    }

    pub fn retreat(&self, state: &FormState) -> FormState {
        if state.current_step > 1 {
            state.with_step(state.current_step - 1)
        } else {
            state.clone()
        }
    }

    pub fn is_final_step(&self, state: &FormState) -> bool {
        state.current_step == self.step_count()
    }

    pub fn can_submit(&self, state: &FormState) -> bool {
        self.is_final_step(state) && self.can_advance(state)
    }

    pub fn finalize(&self, state: &FormState) -> Option<IntakeDetails> {
        if !self.can_submit(state) {
            return None;
        }
        Some(IntakeDetails {
            full_name: state.field(fields::FULL_NAME).to_string(),
            phone: state.field(fields::PHONE).to_string(),
            email: state.field(fields::EMAIL).to_string(),
        })
    }

    pub fn step_progress(&self, state: &FormState, ordinal: usize) -> StepProgress {
        if ordinal < state.current_step {
            StepProgress::Completed
        } else if ordinal == state.current_step {
            StepProgress::Active
        } else {
            StepProgress::Upcoming
        }
    }
}

#[cfg(test)]
#[path = "tests/intake_tests.rs"]
mod tests;
