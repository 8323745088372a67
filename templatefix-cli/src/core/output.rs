use anyhow::Result;
use std::io::Write;

use crate::core::types::*;
use crate::refactor::BatchResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn write_batch(&self, result: &BatchResult) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.render_batch(result, &mut out)
    }

    pub fn render_batch(&self, result: &BatchResult, out: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
            }
            OutputFormat::Text => {
                for file in &result.files {
                    Self::render_file(file, out)?;
                }

                writeln!(out)?;
                writeln!(out, "✨ Fix process completed!")?;
                writeln!(out, "   ✅ Successfully processed: {} files", result.files_processed)?;
                writeln!(out, "   ❌ Failed: {} files", result.files_failed)?;
                if result.functions_migrated > 0 {
                    writeln!(
                        out,
                        "   🔧 Functions migrated: {}",
                        result.functions_migrated
                    )?;
                }
            }
        }
        Ok(())
    }

    fn render_file(file: &FileReport, out: &mut impl Write) -> Result<()> {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.display().to_string());

        writeln!(out, "\n📝 {}", name)?;

        if let Some(error) = &file.error {
            writeln!(out, "  ❌ {}", error)?;
            return Ok(());
        }

        for function in &file.functions {
            match &function.outcome {
                FunctionOutcome::Migrated { rules } => {
                    let labels: Vec<&str> = rules.iter().map(|r| r.label()).collect();
                    writeln!(out, "  ✓  Fixed {} ({})", function.name, labels.join(", "))?;
                }
                FunctionOutcome::AlreadyMigrated => {
                    writeln!(out, "  ✓  {} already migrated", function.name)?;
                }
                FunctionOutcome::Unchanged => {
                    writeln!(out, "  ·  {} needed no changes", function.name)?;
                }
                FunctionOutcome::Skipped { reason } => {
                    writeln!(out, "  ⚠️  {}", reason)?;
                }
            }
        }

        if let Some(diff) = &file.diff {
            writeln!(out, "{}", diff)?;
        }

        if file.written {
            writeln!(
                out,
                "  ✅ Saved changes to {} (+{} -{})",
                name, file.lines_added, file.lines_removed
            )?;
        } else if file.modified {
            writeln!(
                out,
                "  💡 Would change {} (+{} -{}), run without --dry-run to apply",
                name, file.lines_added, file.lines_removed
            )?;
        } else {
            writeln!(out, "  ℹ️  No changes needed for {}", name)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> BatchResult {
        let mut result = BatchResult::new();

        let mut report = FileReport::new(PathBuf::from("/tmp/unique-templates.ts"));
        report.modified = true;
        report.written = true;
        report.lines_added = 4;
        report.lines_removed = 3;
        report.functions.push(FunctionReport {
            name: "generateYogaZenLayout".to_string(),
            outcome: FunctionOutcome::Migrated {
                rules: vec![RuleId::BindingAugmentation, RuleId::FetchElision],
            },
        });
        report.functions.push(FunctionReport {
            name: "generateBakerySweetLayout".to_string(),
            outcome: FunctionOutcome::Skipped {
                reason: "Could not find function generateBakerySweetLayout".to_string(),
            },
        });
        result.add_report(report);
        result.add_report(FileReport::failed(
            PathBuf::from("/tmp/missing.ts"),
            "File not found: /tmp/missing.ts".to_string(),
        ));
        result
    }

    #[test]
    fn test_text_output() {
        let mut buf = Vec::new();
        OutputWriter::new(OutputFormat::Text)
            .render_batch(&sample(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("📝 unique-templates.ts"));
        assert!(text.contains("Fixed generateYogaZenLayout (binding augmentation, fetch elision)"));
        assert!(text.contains("⚠️  Could not find function generateBakerySweetLayout"));
        assert!(text.contains("Saved changes to unique-templates.ts (+4 -3)"));
        assert!(text.contains("Successfully processed: 1 files"));
        assert!(text.contains("Failed: 1 files"));
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        OutputWriter::new(OutputFormat::Json)
            .render_batch(&sample(), &mut buf)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["files_processed"], 1);
        assert_eq!(value["files_failed"], 1);
        let functions = &value["files"][0]["functions"];
        assert_eq!(functions[0]["status"], "migrated");
        assert_eq!(functions[0]["rules"][1], "fetch_elision");
        assert_eq!(functions[1]["status"], "skipped");
    }
}
