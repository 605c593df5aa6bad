//! # Archive Module
//!
//! Reading an unpacked Slack export.
//!
//! ## Key Components
//!
//! - [`reader`] - Reads `users.json`, `channels.json` and per-channel message files
//! - [`timestamp`] - Epoch-seconds codec used by every timestamp field
//! - [`types`] - Typed user, channel and message records

pub mod reader;
pub mod timestamp;
pub mod types;

pub use reader::ArchiveReader;
pub use types::{ArchiveMessage, Channel, Message, MessageSubtype, MessageType, User};
