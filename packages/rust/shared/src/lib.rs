//! Shared types, error model, and configuration for pathscout.
//!
//! This crate is the foundation depended on by all other pathscout crates.
//! It provides:
//! - [`PathscoutError`] — the unified error type
//! - Domain types ([`PathwayRelation`], cache categories, sentinels)
//! - Configuration ([`AppConfig`], [`ScanConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, DefaultsConfig, KeggConfig, ScanConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{PathscoutError, Result};
pub use types::{
    ASSOCIATION_RELATION, CACHE_SCHEMA_VERSION, HUMAN_GENE_PREFIX, PathwayRelation,
    UNKNOWN_NAME, bare_gene_id, category,
};
