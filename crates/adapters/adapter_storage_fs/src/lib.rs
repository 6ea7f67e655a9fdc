//! # stepwise-adapter-storage-fs
//!
//! File system persistence adapter.
//!
//! ## Responsibilities
//! - Implement the `AutomationRepository` port defined in `stepwise-app::ports`
//! - Store every automation as a pretty-printed JSON file named after the
//!   slug of its title
//! - Validate documents on the way in; files failing validation are never
//!   returned as automations
//!
//! ## Dependency rule
//! Depends on `stepwise-app` (for port traits) and `stepwise-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod automation_repo;
mod error;

pub use automation_repo::FsAutomationRepository;
pub use error::StorageError;
