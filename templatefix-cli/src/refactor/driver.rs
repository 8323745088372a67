use std::fs;
use std::path::Path;

use crate::analyzers::FunctionLocator;
use crate::config::MigrationConfig;
use crate::core::{FileReport, FunctionOutcome, FunctionReport, MigrateError};

use super::pipeline::RulePipeline;
use super::preview::{change_stats, unified_diff};
use super::BatchResult;

/// Mode for writing migrated files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write changed files back in place
    Apply,
    /// Run every rule but leave the files alone
    DryRun,
}

/// Runs the rule pipeline over the target functions of each file.
pub struct MigrationDriver {
    pipeline: RulePipeline,
    mode: WriteMode,
    capture_diff: bool,
}

impl MigrationDriver {
    pub fn new(pipeline: RulePipeline, mode: WriteMode) -> Self {
        Self {
            pipeline,
            mode,
            capture_diff: false,
        }
    }

    /// Attach a unified diff to the report of every changed file
    pub fn with_diff(mut self, capture_diff: bool) -> Self {
        self.capture_diff = capture_diff;
        self
    }

    /// Migrate every configured target, one file at a time.
    ///
    /// A failing file is recorded and the batch moves on.
    pub fn run_batch(&self, config: &MigrationConfig) -> BatchResult {
        let mut result = BatchResult::new();

        for target in &config.targets {
            let path = config.resolve(target);
            let report = self.process_file(&path, &target.functions);
            result.add_report(report);
        }

        result
    }

    /// Migrate the named functions of one file.
    ///
    /// Never fails: I/O problems are logged and carried in the report.
    pub fn process_file(&self, path: &Path, functions: &[String]) -> FileReport {
        tracing::info!("Processing {}", display_name(path));

        match self.migrate_file(path, functions) {
            Ok(report) => report,
            Err(e) => {
                match &e {
                    MigrateError::FileNotFound(_) => tracing::warn!("{}", e),
                    _ => tracing::error!("Error processing {}: {}", display_name(path), e),
                }
                FileReport::failed(path.to_path_buf(), e.to_string())
            }
        }
    }

    fn migrate_file(&self, path: &Path, functions: &[String]) -> Result<FileReport, MigrateError> {
        if !path.exists() {
            return Err(MigrateError::FileNotFound(path.to_path_buf()));
        }

        let original = fs::read_to_string(path).map_err(|source| MigrateError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (content, functions) = self.migrate_source(&original, functions)?;

        let mut report = FileReport::new(path.to_path_buf());
        report.functions = functions;

        if content == original {
            tracing::info!("No changes needed for {}", display_name(path));
            return Ok(report);
        }

        report.modified = true;
        (report.lines_added, report.lines_removed) = change_stats(&original, &content);
        if self.capture_diff {
            report.diff = Some(unified_diff(path, &original, &content));
        }

        if self.mode == WriteMode::Apply {
            fs::write(path, &content).map_err(|source| MigrateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            report.written = true;
            tracing::info!("Saved changes to {}", display_name(path));
        }

        Ok(report)
    }

    /// Run the pipeline for each function against the evolving buffer.
    ///
    /// Each lookup sees the edits made for the functions before it.
    pub fn migrate_source(
        &self,
        source: &str,
        functions: &[String],
    ) -> Result<(String, Vec<FunctionReport>), MigrateError> {
        let mut content = source.to_string();
        let mut reports = Vec::with_capacity(functions.len());

        for name in functions {
            let outcome = match FunctionLocator::locate(&content, name) {
                Ok(span) => {
                    let output = self.pipeline.transform(&content, &span, name)?;
                    content = output.text;
                    output.outcome
                }
                Err(e) if e.is_lookup_miss() => {
                    tracing::warn!("{}", e);
                    FunctionOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };

            reports.push(FunctionReport {
                name: name.clone(),
                outcome,
            });
        }

        Ok((content, reports))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
