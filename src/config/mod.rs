//! Configuration module for Sumi-Folio
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a configuration can also be built in code and
//! overridden from the command line before validation.
//!
//! # Example
//!
//! ```no_run
//! use sumi_folio::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("folio.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetcherConfig, OutputConfig, OutputFormat, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
