//! Records read from a Slack export and the canonical message built from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::timestamp::epoch_seconds;

/// A workspace member from `users.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Login handle (like `jesse.plamondon`)
    #[serde(rename = "name", default)]
    pub user_name: String,
    /// Real full name
    #[serde(rename = "real_name", default)]
    pub display_name: String,
    #[serde(rename = "deleted", default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(rename = "has_2fa", default)]
    pub has_two_factor_auth: bool,
}

/// A channel from `channels.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Channel name (like `random`), also the name of its export directory
    pub name: String,
    #[serde(rename = "created", with = "epoch_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "creator", default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(rename = "members", default)]
    pub member_ids: Vec<String>,
}

/// Message type; `message` is the only one Slack exports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Message subtype; absent for normal user messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    ChannelJoin,
    ChannelPurpose,
    ChannelLeave,
    ChannelArchive,
    ChannelName,
    BotMessage,
    FileShare,
    PinnedItem,
    FileComment,
    MeMessage,
    BotAdd,
    BotRemove,
    FileMention,
    ChannelUnarchive,
    #[serde(other)]
    Unknown,
}

/// A message as it appears in a channel's export file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMessage {
    #[serde(rename = "ts", with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "user", default)]
    pub author_id: Option<String>,
    /// Overridden author name, typically set by bots and integrations
    #[serde(rename = "username", default)]
    pub custom_author_name: Option<String>,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(rename = "subtype", default)]
    pub message_subtype: Option<MessageSubtype>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A message linked to its channel and author
///
/// Built by [`crate::merge::merge`]; the derived fields are never read from an archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(flatten)]
    pub source: ArchiveMessage,
    /// Join key between the dataset and the search index
    pub message_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub resolved_author_name: String,
    pub resolved_author_handle: String,
}

impl Message {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.source.timestamp
    }

    /// Message body, empty when the export has none
    pub fn text(&self) -> &str {
        self.source.text.as_deref().unwrap_or_default()
    }
}
