//! Business logic services for the WashTrack server

pub mod catalog;
pub mod cleanup;
pub mod ledger;
pub mod mirror;
pub mod requests;

pub use catalog::CatalogService;
pub use cleanup::CleanupService;
pub use ledger::LedgerService;
pub use mirror::MirrorService;
pub use requests::RequestService;
