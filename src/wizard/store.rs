//! Session-scoped answer storage

use tracing::debug;

use super::answers::{AnswerValue, WizardAnswers};

/// Answers accumulated across all steps of one wizard session.
///
/// Pure storage: merges never validate and never drop keys that are not
/// part of the incoming partial.
#[derive(Debug, Clone, Default)]
pub struct WizardStateStore {
    answers: WizardAnswers,
}

impl WizardStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current answers
    pub fn read(&self) -> WizardAnswers {
        self.answers.clone()
    }

    pub fn get(&self, name: &str) -> Option<&AnswerValue> {
        self.answers.get(name)
    }

    /// Shallow-merge `partial`, overwriting only the keys it contains
    pub fn merge(&mut self, partial: WizardAnswers) {
        debug!(keys = ?partial.sorted_keys(), "Merging step answers");
        self.answers.merge_from(partial);
    }

    pub fn reset(&mut self) {
        debug!(cleared = self.answers.len(), "Resetting wizard answers");
        self.answers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, AnswerValue)]) -> WizardAnswers {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = WizardStateStore::new();
        assert!(store.is_empty());
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_merge_is_additive() {
        let mut store = WizardStateStore::new();
        store.merge(answers(&[("first_name", "Ada".into())]));
        store.merge(answers(&[("color", "blue".into()), ("terms", true.into())]));

        let snapshot = store.read();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get("first_name"), Some(&AnswerValue::from("Ada")));
        assert_eq!(snapshot.get("terms"), Some(&AnswerValue::Bool(true)));
    }

    #[test]
    fn test_merge_overwrites_only_present_keys() {
        let mut store = WizardStateStore::new();
        store.merge(answers(&[("color", "red".into()), ("terms", true.into())]));
        store.merge(answers(&[("color", "blue".into())]));

        assert_eq!(store.get("color"), Some(&AnswerValue::from("blue")));
        assert_eq!(store.get("terms"), Some(&AnswerValue::Bool(true)));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut store = WizardStateStore::new();
        store.merge(answers(&[("first_name", "Ada".into())]));
        let partial = answers(&[("color", "blue".into()), ("terms", true.into())]);

        store.merge(partial.clone());
        let once = store.read();
        store.merge(partial);

        assert_eq!(store.read(), once);
    }

    #[test]
    fn test_read_returns_detached_snapshot() {
        let mut store = WizardStateStore::new();
        store.merge(answers(&[("color", "red".into())]));
        let mut snapshot = store.read();
        snapshot.insert("color", "green");

        assert_eq!(store.get("color"), Some(&AnswerValue::from("red")));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = WizardStateStore::new();
        store.merge(answers(&[("color", "red".into()), ("terms", true.into())]));
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.get("color"), None);
    }
}
