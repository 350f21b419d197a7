//! # Slotbook Core
//!
//! Domain models, error taxonomy, and the recurring-window expansion
//! algorithm for the slotbook scheduling service. This crate is pure:
//! no I/O, no database access, no ambient state.

pub mod errors;
pub mod models;
pub mod slots;
