//! Wizard screen: one step of the session at a time

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use crate::ui::form_field::FieldWidget;
use crate::wizard::{
    FetchTicket, LoadError, OptionSet, PendingLoad, SettleOutcome, StepDefinition,
    StepFormController, SubmitAnswers, ValidationMode, WizardAnswers, WizardError, WizardSession,
    LOAD_FAILURE_NOTICE,
};

mod render;


/// What the event loop should do after a key press
#[derive(Debug)]
pub enum ScreenResult {
    /// Keep going
    Continue,
    /// A step was entered; spawn these option fetches
    Load(Vec<PendingLoad>),
    /// The final submission went through
    Finished(WizardAnswers),
    /// The user quit without submitting
    Quit,
}

pub struct WizardScreen {
    pub(crate) session: WizardSession,
    pub(crate) mode: ValidationMode,
    pub(crate) form: StepFormController,
    pub(crate) widgets: Vec<FieldWidget>,
    /// Index of the focused field
    pub(crate) focus: usize,
    /// Blocking message; all input except dismissal is ignored while set
    pub(crate) alert: Option<String>,
    /// One-line hint shown in the footer
    pub(crate) status: Option<String>,
    submitter: Box<dyn SubmitAnswers + Send>,
}

impl WizardScreen {
    /// Create the screen on the session's current step.
    ///
    /// Returns the option fetches the first step needs.
    pub fn new(
        session: WizardSession,
        mode: ValidationMode,
        submitter: Box<dyn SubmitAnswers + Send>,
    ) -> Result<(Self, Vec<PendingLoad>), WizardError> {
        let form = StepFormController::new(session.current_step().id.clone(), mode);
        let mut screen = Self {
            session,
            mode,
            form,
            widgets: Vec::new(),
            focus: 0,
            alert: None,
            status: None,
            submitter,
        };
        let loads = screen.enter_step()?;
        Ok((screen, loads))
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn form(&self) -> &StepFormController {
        &self.form
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn step(&self) -> &StepDefinition {
        self.session.current_step()
    }

    /// Rebuild the controller for the current step and start its fetches.
    ///
    /// Replacing the controller drops the previous one, which cancels any
    /// fetch it still had in flight.
    fn enter_step(&mut self) -> Result<Vec<PendingLoad>, WizardError> {
        self.form = self.session.controller_for_current(self.mode)?;
        let step = self.session.current_step();
        self.widgets = step
            .fields
            .iter()
            .map(|spec| {
                let value = self.form.value(&spec.name).cloned().unwrap_or_default();
                FieldWidget::from_spec(spec, &value)
            })
            .collect();
        self.focus = 0;

        let loads = self.form.begin_option_loads();
        debug!(step = %step.id, loads = loads.len(), "Entered step");
        Ok(loads)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => return ScreenResult::Quit,
                KeyCode::Char('r') => {
                    self.alert = None;
                    return self.reload_step();
                }
                KeyCode::Char('n') => {
                    self.alert = None;
                    return self.restart();
                }
                _ => return ScreenResult::Continue,
            }
        }

        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return ScreenResult::Continue;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus_next();
                ScreenResult::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_prev();
                ScreenResult::Continue
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => self.back(),
            code => {
                self.edit_focused(code);
                ScreenResult::Continue
            }
        }
    }

    fn focus_next(&mut self) {
        if !self.widgets.is_empty() {
            self.focus = (self.focus + 1) % self.widgets.len();
        }
    }

    fn focus_prev(&mut self) {
        if !self.widgets.is_empty() {
            self.focus = if self.focus == 0 {
                self.widgets.len() - 1
            } else {
                self.focus - 1
            };
        }
    }

    fn edit_focused(&mut self, code: KeyCode) {
        let Some(spec) = self.session.current_step().fields.get(self.focus) else {
            return;
        };
        let Some(widget) = self.widgets.get_mut(self.focus) else {
            return;
        };
        if widget.handle_key(code, self.form.options(&spec.name)) {
            if let Err(e) = self.form.set_value(&spec.name, widget.answer()) {
                warn!(field = %spec.name, error = %e, "Widget out of sync with form");
            }
        }
    }

    fn submit(&mut self) -> ScreenResult {
        if self.session.is_terminal() {
            return self.finish();
        }

        match self.session.submit_step(&mut self.form).map(|_| ()) {
            Ok(()) => {
                self.status = None;
                self.enter_or_alert()
            }
            Err(WizardError::Validation { fields, .. }) => {
                let names: Vec<&str> = self.form.field_names().collect();
                if let Some(first) = names.iter().position(|n| fields.iter().any(|f| f == n)) {
                    self.focus = first;
                }
                ScreenResult::Continue
            }
            Err(e) => {
                self.alert = Some(e.to_string());
                ScreenResult::Continue
            }
        }
    }

    fn finish(&mut self) -> ScreenResult {
        match self.session.finish(self.submitter.as_mut()) {
            Ok(answers) => ScreenResult::Finished(answers),
            Err(e) => {
                self.alert = Some(e.to_string());
                ScreenResult::Continue
            }
        }
    }

    fn back(&mut self) -> ScreenResult {
        match self.session.back().map(|_| ()) {
            Ok(()) => {
                self.status = None;
                self.enter_or_alert()
            }
            Err(WizardError::NoPreviousStep(_)) => {
                self.status = Some("Already at the first step".to_string());
                ScreenResult::Continue
            }
            Err(e) => {
                self.alert = Some(e.to_string());
                ScreenResult::Continue
            }
        }
    }

    /// Discard the draft and re-enter the step, fetching options again
    fn reload_step(&mut self) -> ScreenResult {
        self.status = Some("Step reloaded".to_string());
        self.enter_or_alert()
    }

    /// Drop every answer and start over on the first step
    fn restart(&mut self) -> ScreenResult {
        self.session.restart();
        self.status = Some("Wizard restarted".to_string());
        self.enter_or_alert()
    }

    fn enter_or_alert(&mut self) -> ScreenResult {
        match self.enter_step() {
            Ok(loads) => ScreenResult::Load(loads),
            Err(e) => {
                self.alert = Some(e.to_string());
                ScreenResult::Continue
            }
        }
    }

    /// Apply a finished options fetch to the current step
    pub fn apply_load(
        &mut self,
        field: &str,
        ticket: &FetchTicket,
        result: Result<OptionSet, LoadError>,
    ) -> SettleOutcome {
        let outcome = self.form.settle_options(field, ticket, result);
        match &outcome {
            SettleOutcome::Applied => self.restore_field(field),
            SettleOutcome::Failed(failure) => {
                warn!(field, error = %failure, "Options unavailable");
                self.alert = Some(LOAD_FAILURE_NOTICE.to_string());
            }
            SettleOutcome::Ignored => {}
        }
        outcome
    }

    /// Put the stored answer back into a field whose options just arrived
    fn restore_field(&mut self, field: &str) {
        let Some(stored) = self.session.store().get(field).cloned() else {
            return;
        };
        let Some(index) = self.form.field_names().position(|n| n == field) else {
            return;
        };
        if self.form.restore_loaded(field, &stored).unwrap_or(false) {
            if let Some(widget) = self.widgets.get_mut(index) {
                widget.sync_from(&stored);
            }
        }
    }
}
