//! Business logic services for the kombucha batch tracker

pub mod analysis;
pub mod batch;
pub mod interval;
pub mod rate_limit;
pub mod reminder;

pub use analysis::AnalysisService;
pub use batch::BatchService;
pub use interval::IntervalService;
pub use rate_limit::FixedWindowRateLimiter;
pub use reminder::ReminderService;
