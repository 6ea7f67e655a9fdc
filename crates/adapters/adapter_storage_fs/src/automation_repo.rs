//! File system implementation of [`AutomationRepository`].

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stepwise_app::ports::{AutomationRepository, StoredAutomation};
use stepwise_domain::document::AutomationDocument;
use stepwise_domain::error::{ConflictError, DomainError};
use stepwise_domain::slug::EXTENSION;

use crate::error::StorageError;

/// Extension of the file a document is written to before it is published
/// under its final name.
const STAGING_EXTENSION: &str = "tmp";

/// Directory-backed automation repository.
///
/// A document is first written in full to a hidden staging file, then
/// linked under its final name; the link fails when the name is taken, so
/// an existing file is never overwritten and a failed write never leaves a
/// truncated automation behind.
pub struct FsAutomationRepository {
    dir: PathBuf,
}

impl FsAutomationRepository {
    /// Create a repository storing its files in `dir`. The directory is
    /// created on the first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let plain = Path::new(file_name).file_name() == Some(OsStr::new(file_name));
        if file_name.is_empty() || !plain {
            return Err(StorageError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.dir.join(file_name))
    }

    fn staging_path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!(".{file_name}.{STAGING_EXTENSION}"))
    }
}

impl AutomationRepository for FsAutomationRepository {
    async fn create(&self, document: &AutomationDocument) -> Result<StoredAutomation, DomainError> {
        let file_name = document.file_name();
        let path = self.path_of(&file_name)?;
        let json = document.to_json()?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| StorageError::io(&self.dir, err))?;
        let staging = self.staging_path_of(&file_name);
        let published: Result<(), DomainError> = match tokio::fs::write(&staging, json.as_bytes()).await {
            Ok(()) => match tokio::fs::hard_link(&staging, &path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    Err(ConflictError::FileExists {
                        file_name: file_name.clone(),
                    }
                    .into())
                }
                Err(err) => Err(StorageError::io(&path, err).into()),
            },
            Err(err) => Err(StorageError::io(&staging, err).into()),
        };
        if let Err(err) = tokio::fs::remove_file(&staging).await
            && err.kind() != ErrorKind::NotFound
        {
            tracing::warn!(path = %staging.display(), error = %err, "cannot remove staging file");
        }
        published?;

        tracing::debug!(path = %path.display(), "automation file written");
        Ok(StoredAutomation {
            file_name,
            meta: document.meta.clone(),
        })
    }

    async fn get(&self, file_name: &str) -> Result<Option<AutomationDocument>, DomainError> {
        let path = self.path_of(file_name)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io(&path, err).into()),
        };
        match AutomationDocument::try_parse(&raw) {
            Ok(document) => Ok(Some(document)),
            Err(err) => {
                tracing::debug!(file_name, error = ?err, "automation file rejected");
                Err(err.into())
            }
        }
    }

    async fn list(&self) -> Result<Vec<StoredAutomation>, DomainError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::io(&self.dir, err).into()),
        };

        let mut stored = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StorageError::io(&self.dir, err))?
        {
            let path = entry.path();
            if path.extension() != Some(OsStr::new(EXTENSION)) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(OsStr::to_str) else {
                continue;
            };
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(file_name, error = %err, "cannot read automation file, skipping");
                    continue;
                }
            };
            match AutomationDocument::try_parse(&raw) {
                Ok(document) => stored.push(StoredAutomation {
                    file_name: file_name.to_string(),
                    meta: document.meta,
                }),
                Err(err) => {
                    tracing::warn!(file_name, error = ?err, "invalid automation file, skipping");
                }
            }
        }
        stored.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(stored)
    }

    async fn delete(&self, file_name: &str) -> Result<(), DomainError> {
        let path = self.path_of(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(&path, err).into()),
        }
    }
}
