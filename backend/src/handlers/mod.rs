//! HTTP handlers for the WashTrack API

pub mod activity;
pub mod chemicals;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod requests;

pub use activity::*;
pub use chemicals::*;
pub use dashboard::*;
pub use health::*;
pub use inventory::*;
pub use requests::*;
