//! Output types for the non-interactive `search` command
//!
//! These are serialized to JSON with `--json`, and can be deserialized in
//! tests for type-safe validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::Message;
use crate::search::query::SearchResults;

/// Individual search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageHit {
    pub message_id: String,
    pub date: DateTime<Utc>,
    pub channel: String,
    /// Author handle
    pub user: String,
    /// Author display name
    pub author: String,
    pub text: String,
}

impl From<&Message> for MessageHit {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.message_id.clone(),
            date: message.timestamp(),
            channel: message.channel_name.clone(),
            user: message.resolved_author_handle.clone(),
            author: message.resolved_author_name.clone(),
            text: message.text().to_string(),
        }
    }
}

/// Output from a search
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchOutput {
    pub query: String,
    pub total_matches: usize,
    pub results: Vec<MessageHit>,
    /// Index hits with no message in the cached import
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned_ids: Vec<String>,
}

impl SearchOutput {
    /// Build the output from collected results, keeping at most `limit` hits
    pub fn new(query: impl Into<String>, results: &SearchResults<'_>, limit: usize) -> Self {
        Self {
            query: query.into(),
            total_matches: results.total_matches,
            results: results
                .messages
                .iter()
                .take(limit)
                .map(|message| MessageHit::from(*message))
                .collect(),
            orphaned_ids: results.orphaned.clone(),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string())
    }

    /// Check if there are any results
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Error output for the `search` command
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchErrorOutput {
    pub error: String,
}

impl SearchErrorOutput {
    /// Create a new error output
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize error"}"#.to_string())
    }
}
