//! Loan eligibility evaluation: a shared evaluation context, independently pluggable
//! business rules run in priority order, and an engine that merges their findings into a
//! single decision.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod telemetry;
