//! # Search Module
//!
//! Full-text search over imported messages using Tantivy.
//!
//! The index is derived from the cached dataset and rebuilt from scratch on
//! every import. Hits are resolved back to dataset messages through the
//! stored message id, so a stale index degrades to skipped hits rather than
//! failed searches.
//!
//! ## Key Components
//!
//! - [`indexer`] - Schema and full index rebuilds
//! - [`query`] - Query parsing, execution and hit resolution
//! - [`outputs`] - Serializable search output
//! - [`config`] - Configuration constants for search functionality

pub mod config;
pub mod indexer;
pub mod outputs;
pub mod query;

pub use indexer::{SearchIndexer, rebuild};
pub use query::{MessageSearcher, SearchHits, SearchResults, search};
