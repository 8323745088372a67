use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Could not find function {0}")]
    FunctionNotFound(String),

    #[error("Could not locate anchor in function {0}")]
    AnchorNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MigrateError {
    /// Lookup failures are skips, not file failures
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            MigrateError::FunctionNotFound(_) | MigrateError::AnchorNotFound(_)
        )
    }
}
