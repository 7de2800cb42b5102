//! Error types for wizard step coordination

use thiserror::Error;

/// Errors raised while coordinating steps and forms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("field '{0}' is already registered on this step")]
    DuplicateField(String),

    #[error("field '{0}' is not registered on this step")]
    UnknownField(String),

    /// A step submit was rejected; the listed fields carry inline messages
    #[error("step '{step}' has invalid fields: {}", fields.join(", "))]
    Validation { step: String, fields: Vec<String> },

    #[error("step '{0}' is the last step; there is no next step")]
    NoNextStep(String),

    #[error("step '{0}' is the first step; there is no previous step")]
    NoPreviousStep(String),

    #[error("final submission is only available on the last step (current: '{0}')")]
    NotAtTerminalStep(String),

    #[error("a wizard needs at least one step")]
    NoSteps,

    #[error("submission failed: {0}")]
    Submission(String),
}

impl WizardError {
    /// Whether this error is recovered by showing inline field messages
    pub fn is_validation(&self) -> bool {
        matches!(self, WizardError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_fields() {
        let err = WizardError::Validation {
            step: "additional-info".to_string(),
            fields: vec!["color".to_string(), "terms".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "step 'additional-info' has invalid fields: color, terms"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_navigation_errors_are_not_validation() {
        assert!(!WizardError::NoNextStep("confirmation".to_string()).is_validation());
        assert!(!WizardError::NoPreviousStep("contact".to_string()).is_validation());
    }
}
