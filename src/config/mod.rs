//! Configuration loading, parsing and validation
//!
//! # Example
//!
//! ```no_run
//! use knowledge_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, PipelineConfig, ProcessingMode, StorageConfig, TargetConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
