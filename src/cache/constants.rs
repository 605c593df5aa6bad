//! Constants for data directory, cache and archive file names

/// Directory names
pub const DATA_ROOT_DIR: &str = ".slack-archive-search";
pub const INDEX_DIR: &str = "index";

/// File names
pub const CACHE_FILE: &str = "cache.json";

/// Archive files
pub const USERS_FILE: &str = "users.json";
pub const CHANNELS_FILE: &str = "channels.json";

/// Cache file envelope
pub const CACHE_FORMAT: &str = "slack-archive-search-cache";
pub const CACHE_FORMAT_VERSION: u32 = 1;
