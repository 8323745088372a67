pub mod analyzers;
pub mod config;
pub mod core;
pub mod refactor;

// Re-export key types
pub use crate::config::{BatchTarget, MigrationConfig, TemplateNames};
pub use crate::core::{FileReport, FunctionOutcome, FunctionSpan, MigrateError};
pub use crate::refactor::{BatchResult, MigrationDriver, RulePipeline, WriteMode};
