//! landreg - land registration form controller and record search
//!
//! The [`form`] module sequences a multi-step registration form with
//! per-step validation and a cancellable simulated submission. The [`search`]
//! module answers category lookups from an embedded sample catalog.

pub mod config;
pub mod form;
pub mod logging;
pub mod search;
