//! Shared types and fermentation engine for the Kombucha Tracker
//!
//! This crate holds everything that is pure: batch models, derived-quantity
//! calculators, the batch state machine, analysis correlation and reminder
//! generation. It is used by the backend server and by the WASM bindings.

pub mod calculator;
pub mod clock;
pub mod correlation;
pub mod models;
pub mod reminders;
pub mod status;
pub mod types;
pub mod validation;

pub use calculator::*;
pub use clock::*;
pub use correlation::*;
pub use models::*;
pub use reminders::*;
pub use status::*;
pub use types::*;
pub use validation::*;
