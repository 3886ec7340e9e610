//! Shared error model and configuration for docflow.
//!
//! This crate is the foundation depended on by all other docflow crates.
//! It provides:
//! - [`DocflowError`]: the unified error type
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ActionConfig, AppConfig, BranchConfig, CONFIG_FILE_NAME, INPUT_PATH_KEY, PipelineConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_config_path,
};
pub use error::{DocflowError, Result};
