//! Shared types, error model, and configuration for frontcheck.
//!
//! This crate is the foundation depended on by all other frontcheck crates.
//! It provides:
//! - [`FrontcheckError`], the unified error type
//! - Domain types ([`Domain`], [`Violation`], [`FieldPath`], [`Rule`], [`Severity`])
//! - The YAML tree ([`Node`]) every record is loaded into
//! - Configuration ([`AppConfig`], [`ValidateConfig`], config loading)

pub mod config;
pub mod error;
pub mod node;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, CatalogConfig, ChecksConfig, DataConfig, ValidateConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{FrontcheckError, Result, SourceLocation};
pub use node::{AccessError, Mapping, Node};
pub use types::{Domain, FieldPath, Reference, Rule, Severity, Violation};
