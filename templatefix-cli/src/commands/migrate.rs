use anyhow::Result;

use templatefix::core::{OutputFormat, OutputWriter};
use templatefix::{MigrationConfig, MigrationDriver, RulePipeline, WriteMode};

/// Run the configured batch and print the outcome.
///
/// Returns whether every file was processed without error.
pub fn run(config: MigrationConfig, dry_run: bool, diff: bool, format: OutputFormat) -> Result<bool> {
    let mode = if dry_run {
        WriteMode::DryRun
    } else {
        WriteMode::Apply
    };

    if format == OutputFormat::Text {
        println!("🚀 Starting template fix process...");
        if dry_run {
            println!("   (dry run: no files will be written)");
        }
    }

    let pipeline = RulePipeline::new(config.names.clone())?;
    let driver = MigrationDriver::new(pipeline, mode).with_diff(diff);
    let result = driver.run_batch(&config);

    OutputWriter::new(format).write_batch(&result)?;

    Ok(result.is_success())
}
