//! Automation service: use-cases for storing automations.

use stepwise_domain::document::AutomationDocument;
use stepwise_domain::error::{DomainError, NotFoundError};

use crate::ports::{AutomationRepository, StoredAutomation};

/// Application service for saving, loading and listing automations.
pub struct AutomationService<R> {
    repo: R,
}

impl<R: AutomationRepository> AutomationService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Store a new automation under the file name derived from its title.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::FileExists`](stepwise_domain::error::ConflictError::FileExists)
    /// when the name is taken (the caller should pick another title), or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, document), fields(title = %document.meta.title))]
    pub async fn save(&self, document: &AutomationDocument) -> Result<StoredAutomation, DomainError> {
        let stored = self.repo.create(document).await?;
        tracing::info!(file_name = %stored.file_name, "automation saved");
        Ok(stored)
    }

    /// Load an automation by file name, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when no such file exists,
    /// [`DomainError::Document`] when it fails validation, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, file_name: &str) -> Result<AutomationDocument, DomainError> {
        self.repo.get(file_name).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Automation",
                id: file_name.to_string(),
            }
            .into()
        })
    }

    /// List every valid stored automation.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self) -> Result<Vec<StoredAutomation>, DomainError> {
        self.repo.list().await
    }

    /// Delete a stored automation.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, file_name: &str) -> Result<(), DomainError> {
        self.repo.delete(file_name).await
    }
}
