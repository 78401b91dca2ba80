//! Shared types, error model, and configuration for wikicorpus.
//!
//! This crate is the foundation depended on by all other wikicorpus crates.
//! It provides:
//! - [`CorpusError`]: the unified error type
//! - Domain types ([`ArticleRecord`], [`OutputFormat`])
//! - The category definition input ([`CategoryGroups`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], config loading)

pub mod categories;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use categories::{CategoryGroup, CategoryGroups, load_category_groups};
pub use config::{
    AppConfig, DefaultsConfig, ExtractionConfig, HarvestConfig, RemoteConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CorpusError, Result};
pub use types::{ArticleRecord, OutputFormat};
