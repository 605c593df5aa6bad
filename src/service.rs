use std::path::{Path, PathBuf};

use crate::archive::ArchiveReader;
use crate::cache::CacheStorage;
use crate::dataset::{Dataset, DatasetSummary};
use crate::error::Result;
use crate::merge::{ChannelBatch, merge};
use crate::search::{self, SearchHits};

/// Entry point for the terminal: importing archives, loading the cache and searching
#[derive(Debug, Clone)]
pub struct ArchiveSearchService {
    storage: CacheStorage,
}

impl ArchiveSearchService {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            storage: CacheStorage::new(data_dir)?,
        })
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Import an unpacked export, replacing the cache and the search index
    pub fn import_archive(&self, archive_dir: &Path) -> Result<Dataset> {
        let reader = ArchiveReader::new(archive_dir)?;
        tracing::info!("Importing archive from {}", reader.archive_dir().display());

        tracing::info!("Reading metadata...");
        let users = reader.users()?;
        let channels = reader.channels()?;

        tracing::info!("Reading channel data...");
        let mut batches = Vec::with_capacity(channels.len());
        for channel in &channels {
            let messages = reader
                .channel_messages(channel)?
                .into_iter()
                .flatten()
                .collect();
            batches.push(ChannelBatch {
                channel_id: channel.id.clone(),
                messages,
            });
        }

        let dataset = merge(users, channels, batches)?;

        tracing::info!("Writing cache...");
        self.storage.save_dataset(&dataset)?;
        self.reindex(&dataset)?;

        Ok(dataset)
    }

    /// Load the last import, if there is one
    ///
    /// The search index is rebuilt when it has gone missing from the data directory.
    pub fn load_cache(&self) -> Result<Option<Dataset>> {
        tracing::info!("Reading cache...");
        let dataset = self.storage.load_dataset()?;
        if let Some(dataset) = &dataset {
            if !self.storage.index_path().exists() {
                tracing::warn!("Search index is missing, rebuilding it from the cache");
                self.reindex(dataset)?;
            }
        }
        Ok(dataset)
    }

    /// Import `archive_dir`, or load the last import when no directory is given
    ///
    /// Returns `None` only when no directory is given and nothing was imported before.
    pub fn import_or_load(&self, archive_dir: Option<&Path>) -> Result<Option<Dataset>> {
        match archive_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            Some(dir) => self.import_archive(dir).map(Some),
            None => self.load_cache(),
        }
    }

    /// Rebuild the search index from a dataset
    pub fn reindex(&self, dataset: &Dataset) -> Result<()> {
        search::rebuild(dataset, &self.storage.index_path())
    }

    /// Counts and date range of an import
    pub fn summary(dataset: &Dataset) -> DatasetSummary {
        dataset.summary()
    }

    /// Search the index, resolving hits against `dataset`
    pub fn search<'a>(&self, query: &str, dataset: &'a Dataset) -> Result<SearchHits<'a>> {
        search::search(query, dataset, &self.storage.index_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_import_is_absent() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let service = ArchiveSearchService::new(Some(temp_dir.path().to_path_buf()))?;
        assert!(service.import_or_load(None)?.is_none());
        assert!(service.import_or_load(Some(Path::new("")))?.is_none());
        Ok(())
    }

    #[test]
    fn test_import_missing_archive() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let service = ArchiveSearchService::new(Some(temp_dir.path().join("data")))?;
        let missing = temp_dir.path().join("missing");
        let result = service.import_or_load(Some(missing.as_path()));
        assert!(matches!(result, Err(Error::ArchiveNotFound { .. })));
        assert!(!service.storage().has_cache());
        Ok(())
    }
}
