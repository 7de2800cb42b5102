//! stepform - multi-step form wizard with validated steps and remote options
//!
//! The library exposes the wizard core plus the pieces the binary wires
//! together: configuration, logging, the dev options server and the TUI.

pub mod app;
pub mod config;
pub mod logging;
pub mod rest;
pub mod ui;
pub mod wizard;
