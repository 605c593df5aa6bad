//! # Search Configuration Module
//!
//! Provides configuration constants for search indexing and querying.

/// Buffer size for the Tantivy index writer (50MB)
pub const DEFAULT_BUFFER_SIZE: usize = 50_000_000;

/// Hard cap on the hits a single search returns
pub const MAX_SEARCH_HITS: usize = 1000;

/// Default limit for the non-interactive `search` command
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Maximum allowed query length in characters
pub const MAX_QUERY_LENGTH: usize = 1000;
