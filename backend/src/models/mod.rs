//! Domain models for the WashTrack server
//!
//! Re-exports models from the shared crate; persistence row types live with
//! the services that query them

pub use shared::models::*;
