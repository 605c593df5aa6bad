//! # Cache Module
//!
//! Persists an imported dataset so later runs can skip the import.
//!
//! ## Key Components
//!
//! - [`storage`] - Data directory layout and atomic save/load of the cached dataset
//! - [`constants`] - File and directory names

pub mod constants;
pub mod storage;

pub use storage::CacheStorage;
