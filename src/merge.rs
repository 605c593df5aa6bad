//! Linking raw archive records into one dataset

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::archive::{ArchiveMessage, Channel, Message, User};
use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Display text for a message with neither a known author, a custom name nor an author id
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Messages read for one channel, in export file order
#[derive(Debug, Clone)]
pub struct ChannelBatch {
    pub channel_id: String,
    pub messages: Vec<ArchiveMessage>,
}

/// Merge users, channels and per-channel messages into a dataset sorted newest first
///
/// Duplicate user or channel ids keep the last record read. The only error is a batch
/// for a channel id that is not among `channels`, which means the caller grouped
/// messages incorrectly.
pub fn merge(users: Vec<User>, channels: Vec<Channel>, batches: Vec<ChannelBatch>) -> Result<Dataset> {
    let users = index_by_id(users, |user| &user.id, "user");
    let channels = index_by_id(channels, |channel| &channel.id, "channel");

    let mut messages = Vec::new();
    for batch in batches {
        let channel = channels
            .get(&batch.channel_id)
            .ok_or_else(|| Error::ChannelDesync {
                channel_id: batch.channel_id.clone(),
            })?;

        messages.extend(
            batch
                .messages
                .into_iter()
                .map(|source| link_message(source, channel, &users)),
        );
    }

    // stable: equal timestamps keep encounter order
    messages.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

    tracing::info!(
        "Merged {} messages from {} channels and {} users",
        messages.len(),
        channels.len(),
        users.len()
    );

    Ok(Dataset::from_parts(channels, users, messages))
}

fn index_by_id<T>(
    records: Vec<T>,
    id: impl Fn(&T) -> &String,
    kind: &str,
) -> BTreeMap<String, T> {
    let mut indexed = BTreeMap::new();
    for record in records {
        let key = id(&record).clone();
        if indexed.insert(key.clone(), record).is_some() {
            tracing::debug!("Duplicate {kind} id '{key}', keeping the last record");
        }
    }
    indexed
}

fn link_message(source: ArchiveMessage, channel: &Channel, users: &BTreeMap<String, User>) -> Message {
    let (resolved_author_name, resolved_author_handle) = resolve_author(&source, users);

    Message {
        source,
        message_id: Uuid::new_v4().simple().to_string(),
        channel_id: channel.id.clone(),
        channel_name: channel.name.clone(),
        resolved_author_name,
        resolved_author_handle,
    }
}

/// Display name and handle for a message's author
pub fn resolve_author(message: &ArchiveMessage, users: &BTreeMap<String, User>) -> (String, String) {
    let known_user = message.author_id.as_ref().and_then(|id| users.get(id));
    if let Some(user) = known_user {
        let name = if user.display_name.is_empty() {
            user.user_name.clone()
        } else {
            user.display_name.clone()
        };
        return (name, user.user_name.clone());
    }

    let fallback = message
        .custom_author_name
        .as_ref()
        .or(message.author_id.as_ref())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    (fallback.clone(), fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MessageType;
    use chrono::DateTime;
    use std::collections::HashSet;

    fn user(id: &str, handle: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            user_name: handle.to_string(),
            display_name: name.to_string(),
            is_deleted: false,
            is_admin: false,
            has_two_factor_auth: false,
        }
    }

    fn channel(id: &str, name: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: name.to_string(),
            created_at: DateTime::from_timestamp(1_400_000_000, 0).unwrap(),
            creator_id: None,
            is_archived: false,
            member_ids: Vec::new(),
        }
    }

    fn raw(seconds: i64, author: Option<&str>, custom: Option<&str>, text: &str) -> ArchiveMessage {
        ArchiveMessage {
            timestamp: DateTime::from_timestamp(seconds, 0).unwrap(),
            author_id: author.map(String::from),
            custom_author_name: custom.map(String::from),
            message_type: MessageType::Message,
            message_subtype: None,
            text: Some(text.to_string()),
        }
    }

    fn batch(channel_id: &str, messages: Vec<ArchiveMessage>) -> ChannelBatch {
        ChannelBatch {
            channel_id: channel_id.to_string(),
            messages,
        }
    }

    #[test]
    fn test_merge_links_and_sorts() -> Result<()> {
        let data = merge(
            vec![user("U1", "alice", "Alice Liddell")],
            vec![channel("C1", "general"), channel("C2", "random")],
            vec![
                batch("C1", vec![raw(10, Some("U1"), None, "first"), raw(30, Some("U1"), None, "third")]),
                batch("C2", vec![raw(20, None, Some("deploybot"), "second")]),
            ],
        )?;

        let texts: Vec<_> = data.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);

        let second = &data.messages()[1];
        assert_eq!(second.channel_name, "random");
        assert_eq!(second.resolved_author_handle, "deploybot");

        let third = &data.messages()[0];
        assert_eq!(third.resolved_author_name, "Alice Liddell");
        assert_eq!(third.resolved_author_handle, "alice");

        for message in data.messages() {
            assert!(data.channels().contains_key(&message.channel_id));
        }
        assert!(data.validate().is_ok());
        Ok(())
    }

    #[test]
    fn test_message_ids_are_unique() -> Result<()> {
        let messages = (0..200).map(|i| raw(i, None, None, "x")).collect();
        let data = merge(vec![], vec![channel("C1", "general")], vec![batch("C1", messages)])?;
        let ids: HashSet<_> = data.messages().iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids.len(), 200);
        Ok(())
    }

    #[test]
    fn test_ties_keep_encounter_order() -> Result<()> {
        let data = merge(
            vec![],
            vec![channel("C1", "general"), channel("C2", "random")],
            vec![
                batch("C1", vec![raw(10, None, None, "a"), raw(10, None, None, "b")]),
                batch("C2", vec![raw(10, None, None, "c")]),
            ],
        )?;
        let texts: Vec<_> = data.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn test_unknown_author_falls_back_to_raw_id() {
        let (name, handle) = resolve_author(&raw(1, Some("U404"), None, ""), &BTreeMap::new());
        assert_eq!(name, "U404");
        assert_eq!(handle, "U404");
    }

    #[test]
    fn test_custom_name_preferred_over_raw_id() {
        let (_, handle) = resolve_author(&raw(1, Some("U404"), Some("legacybot"), ""), &BTreeMap::new());
        assert_eq!(handle, "legacybot");
    }

    #[test]
    fn test_authorless_message_gets_placeholder() {
        let (name, handle) = resolve_author(&raw(1, None, None, ""), &BTreeMap::new());
        assert_eq!(name, UNKNOWN_AUTHOR);
        assert_eq!(handle, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() -> Result<()> {
        let data = merge(
            vec![user("U1", "old", "Old"), user("U1", "new", "New")],
            vec![channel("C1", "general"), channel("C1", "renamed")],
            vec![batch("C1", vec![raw(1, Some("U1"), None, "hello")])],
        )?;
        assert_eq!(data.users()["U1"].user_name, "new");
        assert_eq!(data.messages()[0].channel_name, "renamed");
        assert_eq!(data.messages()[0].resolved_author_handle, "new");
        Ok(())
    }

    #[test]
    fn test_batch_for_unknown_channel_is_desync() {
        let result = merge(vec![], vec![], vec![batch("C9", vec![raw(1, None, None, "")])]);
        assert!(matches!(result, Err(Error::ChannelDesync { .. })));
    }
}
