//! Multi-step form wizard core
//!
//! Leaf-first: [`validation`] and [`options`] know nothing about steps,
//! [`form`] binds them to one step, and [`navigator`] moves answers from a
//! step into the session's [`store`].

pub mod answers;
pub mod definition;
pub mod error;
pub mod form;
pub mod navigator;
pub mod options;
pub mod session;
pub mod store;
pub mod validation;

pub use answers::{AnswerValue, WizardAnswers};
pub use definition::{
    DefinitionError, FieldKind, FieldSpec, OptionSource, StepDefinition, StepId, WizardDefinition,
};
pub use error::WizardError;
pub use form::{
    FieldStatus, PendingLoad, StepFormController, SubmitOutcome, ValidationMode,
    UNAVAILABLE_OPTION_MESSAGE,
};
pub use navigator::{Navigate, NavigationTarget, NoopNavigate, WizardNavigator};
pub use options::{
    CancellationToken, FetchTicket, HttpOptionsFetcher, LoadError, LoadFailure, OptionSet,
    OptionsFetcher, OptionsSlot, RemoteOptionsLoader, SettleOutcome, LOAD_FAILURE_NOTICE,
};
pub use session::{CollectingSubmitter, SubmitAnswers, WizardSession};
pub use store::WizardStateStore;
pub use validation::{validate, Rule, RulePattern, ValidationResult};
