pub mod archive;
pub mod cache;
pub mod dataset;
pub mod error;
pub mod merge;
pub mod search;
pub mod service;
pub mod terminal;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use service::ArchiveSearchService;
