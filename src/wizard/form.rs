//! Per-step form controller
//!
//! Binds a step's fields to their rules, tracks the current draft values
//! and gates submission on every field passing validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::answers::{AnswerValue, WizardAnswers};
use super::definition::{FieldKind, OptionSource, StepDefinition};
use super::error::WizardError;
use super::options::{FetchTicket, LoadError, OptionSet, OptionsSlot, SettleOutcome};
use super::validation::{validate, Rule, ValidationResult};

/// Message for a select value that is not in its loaded option set
pub const UNAVAILABLE_OPTION_MESSAGE: &str = "Choose one of the available options";

/// When `set_value` triggers validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Validate on submit; afterwards, re-validate a field whenever it changes
    #[default]
    OnSubmit,
    /// Validate a field on every change
    OnChange,
}

/// Validation state of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Untouched,
    Validating,
    Valid,
    Invalid,
}

#[derive(Debug)]
struct FieldEntry {
    name: String,
    rules: Vec<Rule>,
    value: AnswerValue,
    status: FieldStatus,
    result: Option<ValidationResult>,
    endpoint: Option<String>,
    options: Option<OptionsSlot>,
}

impl FieldEntry {
    fn new(name: String, rules: Vec<Rule>, value: AnswerValue) -> Self {
        Self {
            name,
            rules,
            value,
            status: FieldStatus::Untouched,
            result: None,
            endpoint: None,
            options: None,
        }
    }

    /// Declared rules first, then membership in the loaded option set
    fn run_validation(&mut self) -> ValidationResult {
        self.status = FieldStatus::Validating;
        let mut result = validate(&self.name, &self.value, &self.rules);
        if result.is_valid {
            if let Some(values) = self.options.as_ref().and_then(|s| s.options().values()) {
                let membership = [Rule::one_of(values.to_vec(), UNAVAILABLE_OPTION_MESSAGE)];
                result = validate(&self.name, &self.value, &membership);
            }
        }
        self.status = if result.is_valid {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid
        };
        trace!(field = %self.name, status = ?self.status, "Field validated");
        self.result = Some(result.clone());
        result
    }
}

/// Result of `StepFormController::submit`
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub success: bool,
    /// Registered fields' values on success, empty on failure
    pub values: WizardAnswers,
    pub results: BTreeMap<String, ValidationResult>,
}

impl SubmitOutcome {
    /// Names of the fields that failed, in sorted order
    pub fn failed_fields(&self) -> Vec<String> {
        self.results
            .values()
            .filter(|r| !r.is_valid)
            .map(|r| r.field_name.clone())
            .collect()
    }
}

/// A field that needs its options fetched
#[derive(Debug, Clone)]
pub struct PendingLoad {
    pub field: String,
    pub endpoint: String,
    pub ticket: FetchTicket,
}

/// Draft values and validation state for one step
#[derive(Debug, Default)]
pub struct StepFormController {
    step_id: String,
    fields: Vec<FieldEntry>,
    mode: ValidationMode,
}

impl StepFormController {
    pub fn new(step_id: impl Into<String>, mode: ValidationMode) -> Self {
        Self {
            step_id: step_id.into(),
            fields: Vec::new(),
            mode,
        }
    }

    /// Register every field of `step`, wiring up option slots for selects
    pub fn from_step(step: &StepDefinition, mode: ValidationMode) -> Result<Self, WizardError> {
        let mut controller = Self::new(step.id.clone(), mode);
        for spec in &step.fields {
            controller.register_field(&spec.name, spec.rules.clone())?;
            let entry = controller.entry_mut(&spec.name)?;
            if spec.kind == FieldKind::Checkbox {
                entry.value = AnswerValue::Bool(false);
            }
            match &spec.options {
                Some(OptionSource::Remote { endpoint }) => {
                    entry.endpoint = Some(endpoint.clone());
                    entry.options = Some(OptionsSlot::new());
                }
                Some(OptionSource::Static { values }) => {
                    entry.options = Some(OptionsSlot::preloaded(values.clone()));
                }
                None => {}
            }
        }
        Ok(controller)
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn register_field(&mut self, name: &str, rules: Vec<Rule>) -> Result<(), WizardError> {
        if self.fields.iter().any(|f| f.name == name) {
            return Err(WizardError::DuplicateField(name.to_string()));
        }
        self.fields
            .push(FieldEntry::new(name.to_string(), rules, AnswerValue::Null));
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&FieldEntry, WizardError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut FieldEntry, WizardError> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))
    }

    /// Update a field's draft value.
    ///
    /// Validation runs here only in `OnChange` mode, or for a field that
    /// has already been through a validation pass.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<AnswerValue>,
    ) -> Result<(), WizardError> {
        let mode = self.mode;
        let entry = self.entry_mut(name)?;
        entry.value = value.into();

        let revalidate =
            mode == ValidationMode::OnChange || entry.status != FieldStatus::Untouched;
        if revalidate {
            entry.run_validation();
        }
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<&AnswerValue> {
        self.entry(name).ok().map(|f| &f.value)
    }

    pub fn status(&self, name: &str) -> Option<FieldStatus> {
        self.entry(name).ok().map(|f| f.status)
    }

    /// Seed draft values from stored answers for the fields present there.
    ///
    /// Remote-backed selects are skipped: they stay empty until their
    /// options arrive and `restore_loaded` puts the answer back.
    pub fn prefill(&mut self, answers: &WizardAnswers) {
        for entry in self.fields.iter_mut().filter(|f| f.endpoint.is_none()) {
            if let Some(value) = answers.get(&entry.name) {
                entry.value = value.clone();
            }
        }
    }

    /// Restore a stored answer into a select whose options have loaded.
    ///
    /// Returns `false`, leaving the draft alone, while the options are not
    /// loaded or when the value is not one of them.
    pub fn restore_loaded(&mut self, name: &str, value: &AnswerValue) -> Result<bool, WizardError> {
        let available = match (self.entry(name)?.options.as_ref(), value.as_text()) {
            (Some(slot), Some(text)) => slot
                .options()
                .values()
                .is_some_and(|values| values.iter().any(|v| v == text)),
            _ => false,
        };
        if available {
            self.set_value(name, value.clone())?;
        }
        Ok(available)
    }

    /// Run every field's rules and return the fresh results
    pub fn validate_all(&mut self) -> BTreeMap<String, ValidationResult> {
        self.fields
            .iter_mut()
            .map(|entry| (entry.name.clone(), entry.run_validation()))
            .collect()
    }

    /// Validate everything; on success return the current values
    pub fn submit(&mut self) -> SubmitOutcome {
        let results = self.validate_all();
        let success = results.values().all(|r| r.is_valid);

        let values = if success {
            self.values()
        } else {
            WizardAnswers::new()
        };
        debug!(step = %self.step_id, success, "Step submitted");

        SubmitOutcome {
            success,
            values,
            results,
        }
    }

    /// Current draft values of every registered field
    pub fn values(&self) -> WizardAnswers {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Results of the last validation pass that failed
    pub fn errors(&self) -> Vec<&ValidationResult> {
        self.fields
            .iter()
            .filter_map(|f| f.result.as_ref())
            .filter(|r| !r.is_valid)
            .collect()
    }

    pub fn error_for(&self, name: &str) -> Option<&str> {
        self.entry(name)
            .ok()
            .and_then(|f| f.result.as_ref())
            .and_then(|r| r.message.as_deref())
    }

    pub fn options(&self, name: &str) -> Option<&OptionSet> {
        self.entry(name)
            .ok()
            .and_then(|f| f.options.as_ref())
            .map(OptionsSlot::options)
    }

    pub fn is_loading_options(&self, name: &str) -> bool {
        self.entry(name)
            .ok()
            .and_then(|f| f.options.as_ref())
            .is_some_and(OptionsSlot::is_loading)
    }

    /// Begin a fetch for every remote-backed field, superseding older ones
    pub fn begin_option_loads(&mut self) -> Vec<PendingLoad> {
        self.fields
            .iter_mut()
            .filter_map(|entry| {
                let endpoint = entry.endpoint.clone()?;
                let slot = entry.options.as_mut()?;
                Some(PendingLoad {
                    field: entry.name.clone(),
                    endpoint,
                    ticket: slot.begin(),
                })
            })
            .collect()
    }

    /// Begin a fetch for a single remote-backed field
    pub fn begin_option_load(&mut self, name: &str) -> Result<Option<PendingLoad>, WizardError> {
        let entry = self.entry_mut(name)?;
        let (Some(endpoint), Some(slot)) = (entry.endpoint.clone(), entry.options.as_mut()) else {
            return Ok(None);
        };
        Ok(Some(PendingLoad {
            field: entry.name.clone(),
            endpoint,
            ticket: slot.begin(),
        }))
    }

    /// Hand a fetch result to the field's slot
    pub fn settle_options(
        &mut self,
        name: &str,
        ticket: &FetchTicket,
        result: Result<OptionSet, LoadError>,
    ) -> SettleOutcome {
        match self.entry_mut(name).ok().and_then(|f| f.options.as_mut()) {
            Some(slot) => slot.settle(ticket, result),
            None => SettleOutcome::Ignored,
        }
    }

    /// Cancel every in-flight fetch; used when leaving the step
    pub fn cancel_option_loads(&mut self) {
        for slot in self.fields.iter_mut().filter_map(|f| f.options.as_mut()) {
            slot.cancel();
        }
    }
}

impl Drop for StepFormController {
    fn drop(&mut self) {
        self.cancel_option_loads();
    }
}
