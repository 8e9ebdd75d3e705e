//! Core module - project layout, configuration and record rules

pub mod config;
pub mod merge;
pub mod normalize;
pub mod project;

pub use config::{Config, ConfigError, StoreConfig};
pub use merge::{clean_batch, merge_records, MergeStats};
pub use project::{Project, ProjectError};
