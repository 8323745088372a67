use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;

use templatefix::core::OutputFormat;
use templatefix::{BatchTarget, MigrationConfig};

#[derive(Parser)]
#[command(name = "templatefix")]
#[command(author, version)]
#[command(
    about = "Migrate page templates from placeholder image queries to direct image URLs",
    long_about = "Rewrites the named layout functions of generated-page templates so they \
                  render image URLs and captions directly. Functions that are already \
                  migrated are left alone, so the batch is safe to run repeatedly."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Config file (defaults to ./templatefix.toml, then ~/.config/templatefix/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory template paths are resolved against
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Run every rule without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Print a unified diff for each changed file
    #[arg(long)]
    diff: bool,

    /// Migrate a single file instead of the configured batch
    file: Option<PathBuf>,

    /// Functions to migrate in FILE, in order
    #[arg(requires = "file")]
    functions: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("templatefix=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("templatefix=info")
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = MigrationConfig::load(cli.config.as_deref())?;

    if let Some(file) = cli.file {
        if cli.functions.is_empty() {
            anyhow::bail!("No functions given for {}", file.display());
        }
        config.targets = vec![BatchTarget {
            file,
            functions: cli.functions,
        }];
        config.root = cli.root.unwrap_or_else(|| PathBuf::from("."));
    } else if let Some(root) = cli.root {
        config.root = root;
    }

    let success = commands::migrate::run(config, cli.dry_run, cli.diff, cli.format)?;
    if !success {
        std::process::exit(1);
    }

    Ok(())
}
