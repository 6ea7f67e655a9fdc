//! Automation repository port: persistence for automation documents.

use std::future::Future;

use stepwise_domain::document::{AutomationDocument, Meta};
use stepwise_domain::error::DomainError;

/// Listing entry for a stored automation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAutomation {
    pub file_name: String,
    pub meta: Meta,
}

/// Repository for persisting and querying [`AutomationDocument`]s, keyed by
/// file name.
pub trait AutomationRepository {
    /// Store a new document under its derived file name.
    ///
    /// Fails with a `FileExists` conflict when that name is taken.
    fn create(
        &self,
        document: &AutomationDocument,
    ) -> impl Future<Output = Result<StoredAutomation, DomainError>> + Send;

    /// Load and validate a document. `None` when no such file exists.
    fn get(
        &self,
        file_name: &str,
    ) -> impl Future<Output = Result<Option<AutomationDocument>, DomainError>> + Send;

    /// Every stored document that passes validation, sorted by file name.
    fn list(&self) -> impl Future<Output = Result<Vec<StoredAutomation>, DomainError>> + Send;

    /// Delete a stored document. Deleting a missing file is not an error.
    fn delete(&self, file_name: &str) -> impl Future<Output = Result<(), DomainError>> + Send;
}
