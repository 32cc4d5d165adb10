//! HTTP request handlers

pub mod analysis;
pub mod batch;
pub mod calculator;
pub mod health;
pub mod interval;
pub mod reminder;

pub use analysis::*;
pub use batch::*;
pub use calculator::*;
pub use health::*;
pub use interval::*;
pub use reminder::*;
