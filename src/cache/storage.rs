use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cache::constants::{CACHE_FILE, CACHE_FORMAT, CACHE_FORMAT_VERSION, DATA_ROOT_DIR, INDEX_DIR};
use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Manages the data directory holding the cached import and its search index
#[derive(Debug, Clone)]
pub struct CacheStorage {
    data_dir: PathBuf,
}

#[derive(Serialize)]
struct CacheEnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    dataset: &'a Dataset,
}

#[derive(Deserialize)]
struct CacheHeader {
    format: String,
    version: u32,
}

#[derive(Deserialize)]
struct CacheEnvelope {
    dataset: Dataset,
}

impl CacheStorage {
    /// Create a new storage instance, defaulting to `~/.slack-archive-search`
    pub fn new(custom_data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match custom_data_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or_else(|| Error::InvalidInput("Failed to get home directory".to_string()))?
                .join(DATA_ROOT_DIR),
        };

        fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the path of the cached dataset
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE)
    }

    /// Get the directory of the search index
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_DIR)
    }

    /// Check if an import has been cached
    pub fn has_cache(&self) -> bool {
        self.cache_path().is_file()
    }

    pub fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        save(dataset, &self.cache_path())
    }

    pub fn load_dataset(&self) -> Result<Option<Dataset>> {
        load(&self.cache_path())
    }
}

/// Write a dataset to `path`, replacing any previous file atomically
///
/// The data goes to a temporary file in the same directory which is then renamed
/// over `path`, so an interrupted write never leaves a truncated cache behind.
pub fn save(dataset: &Dataset, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file_mut());
        let envelope = CacheEnvelopeRef {
            format: CACHE_FORMAT,
            version: CACHE_FORMAT_VERSION,
            dataset,
        };
        serde_json::to_writer(&mut writer, &envelope).map_err(std::io::Error::from)?;
        writer.flush()?;
    }
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;

    tracing::info!(
        "Cached {} messages to {}",
        dataset.messages().len(),
        path.display()
    );
    Ok(())
}

/// Read a dataset written by [`save`]
///
/// Returns `None` when no cache exists yet. A file that exists but cannot be
/// parsed or fails validation is reported as [`Error::CacheCorrupt`].
pub fn load(path: &Path) -> Result<Option<Dataset>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let corrupt = |reason: String| Error::CacheCorrupt {
        path: path.to_path_buf(),
        reason,
    };

    let header: CacheHeader = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
    if header.format != CACHE_FORMAT {
        return Err(corrupt(format!("unexpected format '{}'", header.format)));
    }
    if header.version != CACHE_FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported version {} (expected {CACHE_FORMAT_VERSION})",
            header.version
        )));
    }

    let envelope: CacheEnvelope = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
    envelope.dataset.validate().map_err(corrupt)?;

    tracing::info!(
        "Loaded {} cached messages from {}",
        envelope.dataset.messages().len(),
        path.display()
    );
    Ok(Some(envelope.dataset))
}
