//! Route handlers for the options server.

pub mod health;
pub mod options;
