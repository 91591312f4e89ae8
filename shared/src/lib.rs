//! Shared types and domain rules for the WashTrack inventory platform
//!
//! This crate contains the pure inventory arithmetic used by the backend:
//! unit conversion, quantity validation, the low-stock rule table, and the
//! display/reporting helpers, along with the models they operate on.

pub mod models;
pub mod reporting;
pub mod thresholds;
pub mod types;
pub mod units;
pub mod validation;

pub use models::*;
pub use types::*;
