//! Wizard session lifecycle
//!
//! A [`WizardSession`] is created when the wizard starts and owns the answer
//! store for as long as the session lives. Hosts pass it around by `&mut`
//! rather than reaching for a global.

use tracing::{info, warn};
use uuid::Uuid;

use super::answers::WizardAnswers;
use super::definition::{StepDefinition, WizardDefinition};
use super::error::WizardError;
use super::form::{StepFormController, ValidationMode};
use super::navigator::{Navigate, NoopNavigate, WizardNavigator};
use super::store::WizardStateStore;

/// External capability that receives the final, validated answers
pub trait SubmitAnswers {
    fn submit(&mut self, answers: &WizardAnswers) -> anyhow::Result<()>;
}

/// Keeps every submitted payload in memory
#[derive(Debug, Default)]
pub struct CollectingSubmitter {
    pub submitted: Vec<WizardAnswers>,
}

impl SubmitAnswers for CollectingSubmitter {
    fn submit(&mut self, answers: &WizardAnswers) -> anyhow::Result<()> {
        self.submitted.push(answers.clone());
        Ok(())
    }
}

pub struct WizardSession {
    id: Uuid,
    definition: WizardDefinition,
    store: WizardStateStore,
    navigator: WizardNavigator,
}

impl WizardSession {
    pub fn start(definition: WizardDefinition) -> Result<Self, WizardError> {
        Self::start_with_navigate(definition, Box::new(NoopNavigate))
    }

    pub fn start_with_navigate(
        definition: WizardDefinition,
        navigate: Box<dyn Navigate + Send>,
    ) -> Result<Self, WizardError> {
        let navigator = WizardNavigator::with_navigate(definition.step_ids(), navigate)?;
        let id = Uuid::new_v4();
        info!(session = %id, wizard = %definition.name, "Wizard session started");

        Ok(Self {
            id,
            definition,
            store: WizardStateStore::new(),
            navigator,
        })
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn store(&self) -> &WizardStateStore {
        &self.store
    }

    pub fn navigator(&self) -> &WizardNavigator {
        &self.navigator
    }

    pub fn current_step(&self) -> &StepDefinition {
        // Navigator steps come from the definition, so the lookup cannot miss
        &self.definition.steps[self.navigator.position()]
    }

    pub fn is_terminal(&self) -> bool {
        self.navigator.is_terminal()
    }

    /// Build a controller for the current step, pre-filled from the store
    pub fn controller_for_current(
        &self,
        mode: ValidationMode,
    ) -> Result<StepFormController, WizardError> {
        let mut controller = StepFormController::from_step(self.current_step(), mode)?;
        controller.prefill(&self.store.read());
        Ok(controller)
    }

    /// Submit the step behind `controller` and advance on success.
    ///
    /// On a validation failure the store is untouched and the controller
    /// keeps the results for inline display.
    pub fn submit_step(
        &mut self,
        controller: &mut StepFormController,
    ) -> Result<&StepDefinition, WizardError> {
        let outcome = controller.submit();
        if !outcome.success {
            return Err(WizardError::Validation {
                step: controller.step_id().to_string(),
                fields: outcome.failed_fields(),
            });
        }

        controller.cancel_option_loads();
        self.navigator.advance(&mut self.store, outcome.values)?;
        Ok(self.current_step())
    }

    /// Go back one step without validating or storing the current draft
    pub fn back(&mut self) -> Result<&StepDefinition, WizardError> {
        self.navigator.retreat()?;
        Ok(self.current_step())
    }

    /// Hand the accumulated answers to `submitter` and clear the session.
    ///
    /// Only available on the terminal step. The store is cleared only after
    /// the submitter accepts the payload.
    pub fn finish(&mut self, submitter: &mut dyn SubmitAnswers) -> Result<WizardAnswers, WizardError> {
        if !self.navigator.is_terminal() {
            return Err(WizardError::NotAtTerminalStep(
                self.navigator.current().to_string(),
            ));
        }

        let answers = self.store.read();
        submitter.submit(&answers).map_err(|e| {
            warn!(session = %self.id, error = %e, "Final submission failed");
            WizardError::Submission(e.to_string())
        })?;

        info!(session = %self.id, fields = answers.len(), "Wizard submitted");
        self.store.reset();
        self.navigator.restart();
        Ok(answers)
    }

    /// Discard all answers and return to the first step
    pub fn restart(&mut self) {
        self.store.reset();
        self.navigator.restart();
    }
}
