pub mod dialogs;
pub mod form_field;
pub mod terminal_guard;
pub mod wizard_screen;

pub use form_field::FieldWidget;
pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use wizard_screen::{ScreenResult, WizardScreen};
