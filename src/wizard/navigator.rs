//! Step sequencing

use tracing::info;

use super::answers::WizardAnswers;
use super::definition::StepId;
use super::error::WizardError;
use super::store::WizardStateStore;

/// Where the host should route after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    Forward,
    Back,
    Step(StepId),
}

/// Host-supplied routing capability. The core only calls it.
pub trait Navigate {
    fn navigate(&mut self, target: NavigationTarget);
}

/// For hosts that read the current step back from the navigator instead
pub struct NoopNavigate;

impl Navigate for NoopNavigate {
    fn navigate(&mut self, _target: NavigationTarget) {}
}

/// Moves through an ordered list of steps. The first step is the initial
/// state; the last one is terminal.
pub struct WizardNavigator {
    steps: Vec<StepId>,
    current: usize,
    navigate: Box<dyn Navigate + Send>,
}

impl WizardNavigator {
    pub fn new(steps: Vec<StepId>) -> Result<Self, WizardError> {
        Self::with_navigate(steps, Box::new(NoopNavigate))
    }

    pub fn with_navigate(
        steps: Vec<StepId>,
        navigate: Box<dyn Navigate + Send>,
    ) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        Ok(Self {
            steps,
            current: 0,
            navigate,
        })
    }

    pub fn current(&self) -> &str {
        &self.steps[self.current]
    }

    /// Zero-based position of the current step
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_terminal(&self) -> bool {
        self.current + 1 == self.steps.len()
    }

    /// Merge `step_answers` into the store and move to the next step.
    ///
    /// At the terminal step this fails before touching the store.
    pub fn advance(
        &mut self,
        store: &mut WizardStateStore,
        step_answers: WizardAnswers,
    ) -> Result<&str, WizardError> {
        if self.is_terminal() {
            return Err(WizardError::NoNextStep(self.current().to_string()));
        }

        store.merge(step_answers);
        self.current += 1;
        info!(step = %self.current(), "Advanced to next step");
        self.navigate.navigate(NavigationTarget::Forward);
        Ok(self.current())
    }

    /// Move to the previous step. Never touches the answer store.
    pub fn retreat(&mut self) -> Result<&str, WizardError> {
        if self.is_first() {
            return Err(WizardError::NoPreviousStep(self.current().to_string()));
        }

        self.current -= 1;
        info!(step = %self.current(), "Returned to previous step");
        self.navigate.navigate(NavigationTarget::Back);
        Ok(self.current())
    }

    /// Return to the first step
    pub fn restart(&mut self) {
        self.current = 0;
        let first = self.steps[0].clone();
        self.navigate.navigate(NavigationTarget::Step(first));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every navigation call
    struct RecordingNavigate(Arc<Mutex<Vec<NavigationTarget>>>);

    impl Navigate for RecordingNavigate {
        fn navigate(&mut self, target: NavigationTarget) {
            self.0.lock().unwrap().push(target);
        }
    }

    fn steps() -> Vec<StepId> {
        vec![
            "contact".to_string(),
            "additional-info".to_string(),
            "confirmation".to_string(),
        ]
    }

    fn answers(pairs: &[(&str, &str)]) -> WizardAnswers {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_starts_at_first_step() {
        let nav = WizardNavigator::new(steps()).unwrap();
        assert_eq!(nav.current(), "contact");
        assert!(nav.is_first());
        assert!(!nav.is_terminal());
        assert_eq!(nav.step_count(), 3);
    }

    #[test]
    fn test_empty_steps_rejected() {
        assert!(matches!(WizardNavigator::new(vec![]), Err(WizardError::NoSteps)));
    }

    #[test]
    fn test_advance_merges_then_moves() {
        let mut nav = WizardNavigator::new(steps()).unwrap();
        let mut store = WizardStateStore::new();

        let next = nav
            .advance(&mut store, answers(&[("first_name", "Ada")]))
            .unwrap()
            .to_string();

        assert_eq!(next, "additional-info");
        assert_eq!(nav.position(), 1);
        assert!(store.get("first_name").is_some());
    }

    #[test]
    fn test_advance_at_terminal_fails_without_merging() {
        let mut nav = WizardNavigator::new(steps()).unwrap();
        let mut store = WizardStateStore::new();
        nav.advance(&mut store, WizardAnswers::new()).unwrap();
        nav.advance(&mut store, WizardAnswers::new()).unwrap();
        assert!(nav.is_terminal());

        let err = nav
            .advance(&mut store, answers(&[("late", "value")]))
            .unwrap_err();

        assert_eq!(err, WizardError::NoNextStep("confirmation".to_string()));
        assert!(store.get("late").is_none());
    }

    #[test]
    fn test_retreat_leaves_store_untouched() {
        let mut nav = WizardNavigator::new(steps()).unwrap();
        let mut store = WizardStateStore::new();
        nav.advance(&mut store, answers(&[("first_name", "Ada")]))
            .unwrap();
        let before = store.read();

        assert_eq!(nav.retreat().unwrap(), "contact");
        assert_eq!(store.read(), before);
    }

    #[test]
    fn test_retreat_at_first_step_fails() {
        let mut nav = WizardNavigator::new(steps()).unwrap();
        assert_eq!(
            nav.retreat().unwrap_err(),
            WizardError::NoPreviousStep("contact".to_string())
        );
    }

    #[test]
    fn test_single_step_wizard_is_initial_and_terminal() {
        let nav = WizardNavigator::new(vec!["only".to_string()]).unwrap();
        assert!(nav.is_first());
        assert!(nav.is_terminal());
    }

    #[test]
    fn test_navigate_capability_is_called() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut nav =
            WizardNavigator::with_navigate(steps(), Box::new(RecordingNavigate(calls.clone())))
                .unwrap();
        let mut store = WizardStateStore::new();

        nav.advance(&mut store, WizardAnswers::new()).unwrap();
        nav.retreat().unwrap();
        let _ = nav.retreat();
        nav.restart();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                NavigationTarget::Forward,
                NavigationTarget::Back,
                NavigationTarget::Step("contact".to_string()),
            ]
        );
    }
}
