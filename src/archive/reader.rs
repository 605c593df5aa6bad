use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::types::{ArchiveMessage, Channel, User};
use crate::cache::constants::{CHANNELS_FILE, USERS_FILE};
use crate::error::{Error, Result};

/// Reads the files of an unpacked Slack export
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    archive_dir: PathBuf,
}

impl ArchiveReader {
    /// Create a reader for an export directory, which must already exist
    pub fn new(archive_dir: impl Into<PathBuf>) -> Result<Self> {
        let archive_dir = archive_dir.into();
        if !archive_dir.is_dir() {
            return Err(Error::ArchiveNotFound { path: archive_dir });
        }
        Ok(Self { archive_dir })
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn users(&self) -> Result<Vec<User>> {
        read_users(&self.archive_dir.join(USERS_FILE))
    }

    pub fn channels(&self) -> Result<Vec<Channel>> {
        read_channels(&self.archive_dir.join(CHANNELS_FILE))
    }

    /// All message batches of a channel, one entry per export file, in file name order
    pub fn channel_messages(&self, channel: &Channel) -> Result<Vec<Vec<ArchiveMessage>>> {
        channel_message_files(&self.archive_dir, channel)?
            .iter()
            .map(|path| read_channel_messages(path))
            .collect()
    }
}

pub fn read_users(path: &Path) -> Result<Vec<User>> {
    read_json(path)
}

pub fn read_channels(path: &Path) -> Result<Vec<Channel>> {
    read_json(path)
}

pub fn read_channel_messages(path: &Path) -> Result<Vec<ArchiveMessage>> {
    read_json(path)
}

/// List the export files of a channel, sorted by file name
///
/// Slack names them by day (`2015-06-03.json`), so the order is chronological.
/// A channel that never had messages has no directory and yields no files.
pub fn channel_message_files(archive_dir: &Path, channel: &Channel) -> Result<Vec<PathBuf>> {
    validate_channel_name(&channel.name)?;

    let channel_dir = archive_dir.join(&channel.name);
    if !channel_dir.is_dir() {
        tracing::debug!(
            "No export directory for channel #{} at {}",
            channel.name,
            channel_dir.display()
        );
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&channel_dir).map_err(|source| Error::ArchiveRead {
        path: channel_dir.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::ArchiveRead {
            path: channel_dir.clone(),
            source,
        })?;
        let path = entry.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    tracing::debug!("Found {} export files for #{}", files.len(), channel.name);
    Ok(files)
}

/// Reject channel names that would escape the archive when used as a directory
fn validate_channel_name(name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || Path::new(name).is_absolute();
    if unsafe_name {
        return Err(Error::UnsafeChannelName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|source| Error::ArchiveRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| Error::ArchiveParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn channel(name: &str) -> Channel {
        Channel {
            id: format!("C-{name}"),
            name: name.to_string(),
            created_at: DateTime::from_timestamp(1_400_000_000, 0).unwrap(),
            creator_id: None,
            is_archived: false,
            member_ids: Vec::new(),
        }
    }

    #[test]
    fn test_missing_archive_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            ArchiveReader::new(&missing),
            Err(Error::ArchiveNotFound { .. })
        ));
    }

    #[test]
    fn test_message_files_sorted_and_filtered() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path().join("general");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("2015-06-04.json"), "[]")?;
        fs::write(dir.join("2015-06-03.json"), "[]")?;
        fs::write(dir.join("notes.txt"), "not an export file")?;

        let files = channel_message_files(temp_dir.path(), &channel("general"))?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2015-06-03.json", "2015-06-04.json"]);
        Ok(())
    }

    #[test]
    fn test_channel_without_directory_has_no_messages() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let reader = ArchiveReader::new(temp_dir.path())?;
        assert!(reader.channel_messages(&channel("empty"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unsafe_channel_names() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["", "..", "../etc", "a/b", "a\\b"] {
            assert!(
                matches!(
                    channel_message_files(temp_dir.path(), &channel(name)),
                    Err(Error::UnsafeChannelName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_error_carries_path() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(USERS_FILE);
        fs::write(&path, r#"[{"id": 42}]"#)?;

        match read_users(&path) {
            Err(Error::ArchiveParse { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected ArchiveParse, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_non_utf8_file_is_a_parse_error() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(USERS_FILE);
        fs::write(&path, [b'[', 0xff, b']'])?;

        match read_users(&path) {
            Err(Error::ArchiveParse { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected ArchiveParse, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_malformed_timestamp_is_a_parse_error() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("2015-06-03.json");
        fs::write(&path, r#"[{"ts": "soon", "type": "message"}]"#)?;

        let err = read_channel_messages(&path).unwrap_err();
        assert!(matches!(err, Error::ArchiveParse { .. }));
        assert!(err.to_string().contains("soon"));
        Ok(())
    }
}
