//! Domain models for the Kombucha Tracker

mod analysis;
mod batch;
mod interval;
mod note;
mod reminder;

pub use analysis::*;
pub use batch::*;
pub use interval::*;
pub use note::*;
pub use reminder::*;
