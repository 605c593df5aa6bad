use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::archive::{Channel, Message, User};

/// Everything imported from one archive: channels, users and all messages newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DatasetParts")]
pub struct Dataset {
    channels: BTreeMap<String, Channel>,
    users: BTreeMap<String, User>,
    messages: Vec<Message>,
    #[serde(skip)]
    by_id: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct DatasetParts {
    channels: BTreeMap<String, Channel>,
    users: BTreeMap<String, User>,
    messages: Vec<Message>,
}

impl From<DatasetParts> for Dataset {
    fn from(parts: DatasetParts) -> Self {
        Self::from_parts(parts.channels, parts.users, parts.messages)
    }
}

/// Counts and date range shown above the search prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub message_count: usize,
    pub user_count: usize,
    pub channel_count: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl Dataset {
    /// Assemble a dataset; `messages` are expected newest first
    pub fn from_parts(
        channels: BTreeMap<String, Channel>,
        users: BTreeMap<String, User>,
        messages: Vec<Message>,
    ) -> Self {
        let by_id = messages
            .iter()
            .enumerate()
            .map(|(position, message)| (message.message_id.clone(), position))
            .collect();

        Self {
            channels,
            users,
            messages,
            by_id,
        }
    }

    pub fn channels(&self) -> &BTreeMap<String, Channel> {
        &self.channels
    }

    pub fn users(&self) -> &BTreeMap<String, User> {
        &self.users
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Find a message by the id the search index stores for it
    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.by_id
            .get(message_id)
            .and_then(|&position| self.messages.get(position))
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            message_count: self.messages.len(),
            user_count: self.users.len(),
            channel_count: self.channels.len(),
            earliest: self.messages.last().map(Message::timestamp),
            latest: self.messages.first().map(Message::timestamp),
        }
    }

    /// Check the structural invariants a loaded dataset must satisfy
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        for (key, channel) in &self.channels {
            if *key != channel.id {
                return Err(format!(
                    "channel '{}' is stored under key '{key}'",
                    channel.id
                ));
            }
        }

        for (key, user) in &self.users {
            if *key != user.id {
                return Err(format!("user '{}' is stored under key '{key}'", user.id));
            }
        }

        for (position, message) in self.messages.iter().enumerate() {
            if message.message_id.is_empty() {
                return Err(format!("message #{position} has no id"));
            }

            let Some(channel) = self.channels.get(&message.channel_id) else {
                return Err(format!(
                    "message {} references unknown channel '{}'",
                    message.message_id, message.channel_id
                ));
            };
            if channel.name != message.channel_name {
                return Err(format!(
                    "message {} names channel '{}' but '{}' is called '{}'",
                    message.message_id, message.channel_name, channel.id, channel.name
                ));
            }
        }

        if self.by_id.len() != self.messages.len() {
            return Err(format!(
                "{} messages share an id with another message",
                self.messages.len() - self.by_id.len()
            ));
        }

        if let Some(pair) = self
            .messages
            .windows(2)
            .find(|pair| pair[0].timestamp() < pair[1].timestamp())
        {
            return Err(format!(
                "messages are not sorted newest first (message {} precedes newer message {})",
                pair[0].message_id, pair[1].message_id
            ));
        }

        Ok(())
    }
}
