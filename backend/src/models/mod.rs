//! Database models for the Kombucha Tracker
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
