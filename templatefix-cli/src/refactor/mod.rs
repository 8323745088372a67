mod driver;
mod pipeline;
mod preview;
pub mod rules;

pub use driver::{MigrationDriver, WriteMode};
pub use pipeline::{PipelineOutput, RulePipeline};
pub use preview::unified_diff;

use std::path::PathBuf;

use crate::core::FileReport;

/// Result of a batch migration
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchResult {
    /// Files read and handled without error
    pub files_processed: usize,

    /// Files that could not be read or written
    pub files_failed: usize,

    /// Functions changed by at least one rule
    pub functions_migrated: usize,

    /// Files whose content changed
    pub files_modified: Vec<PathBuf>,

    /// Errors encountered
    pub errors: Vec<String>,

    /// Per-file detail, in processing order
    pub files: Vec<FileReport>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self {
            files_processed: 0,
            files_failed: 0,
            functions_migrated: 0,
            files_modified: Vec::new(),
            errors: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn add_report(&mut self, report: FileReport) {
        match &report.error {
            Some(error) => {
                self.files_failed += 1;
                self.errors
                    .push(format!("{}: {}", report.path.display(), error));
            }
            None => {
                self.files_processed += 1;
                self.functions_migrated += report.migrated_count();
                if report.modified {
                    self.files_modified.push(report.path.clone());
                }
            }
        }
        self.files.push(report);
    }

    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        Self::new()
    }
}
