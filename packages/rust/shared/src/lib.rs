//! Shared types, error model, and configuration for the exam archive toolkit.
//!
//! This crate is the foundation depended on by all other `examarchive` crates.
//! It provides:
//! - [`ExamArchiveError`]: the unified error type
//! - API domain types ([`Faculty`], [`Module`], [`Subject`], [`Test`], [`User`], ...)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalysisConfig, ApiConfig, AppConfig, BrowseConfig, CacheConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ExamArchiveError, Result};
pub use types::{
    Address, Faculty, Module, QuestionAnalysis, QuestionFrequency, Subject, Test, TestQuery,
    TestType, Token, User,
};
