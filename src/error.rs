//! Error types for the import, cache and search pipeline

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A timestamp that is neither a number nor a numeric string
    #[error("Can't parse {kind} value '{raw}' as a Unix epoch timestamp")]
    MalformedTimestamp { raw: String, kind: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("There's no archive directory at {}", path.display())]
    ArchiveNotFound { path: PathBuf },

    #[error("Failed to read archive file {}: {source}", path.display())]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse archive file {}: {source}", path.display())]
    ArchiveParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Channel names become directory names, so they must stay inside the archive
    #[error("Channel name '{name}' can't be used as an archive directory")]
    UnsafeChannelName { name: String },

    /// Messages were grouped under a channel id the merge was never given
    #[error("Messages reference channel '{channel_id}' which is not part of the import")]
    ChannelDesync { channel_id: String },

    #[error("Cache file {} is corrupt: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("Invalid search query '{input}': {message}")]
    QuerySyntax { message: String, input: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Search index error: {0}")]
    Index(#[from] tantivy::TantivyError),
}

impl Error {
    /// Whether the error leaves the process in a state where the user can simply try again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::QuerySyntax { .. }
                | Error::CacheCorrupt { .. }
                | Error::ArchiveNotFound { .. }
                | Error::ArchiveRead { .. }
                | Error::ArchiveParse { .. }
                | Error::UnsafeChannelName { .. }
                | Error::MalformedTimestamp { .. }
        )
    }
}
