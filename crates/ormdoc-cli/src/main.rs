//! ormdoc CLI
//!
//! Synchronizes Doctrine-style `.orm.xml` mappings into the annotation doc
//! blocks of a project's PHP entity classes:
//! - `ormdoc <PROJECT_DIR>` patches every entity described by a mapping file
//! - `--dry-run` reports what would change without writing
//! - `--dump` prints the parsed mappings as JSON and stops

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use ormdoc_sync::{
    load_artifacts, load_mappings, scan_project, FsStore, MappingDocument, Synchronizer,
};
use std::path::{Path, PathBuf};

mod config;
mod output;

use output::{ConsoleSink, RunLog};

#[derive(Parser)]
#[command(name = "ormdoc")]
#[command(
    author,
    version,
    about = "Synchronize ORM mapping files into entity doc-block annotations"
)]
struct Cli {
    /// Project root holding mapping files and PHP sources
    project: PathBuf,

    /// Config file (default: <PROJECT>/ormdoc.json when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Namespace prefix never patched nor traversed (repeatable)
    #[arg(long = "exclude-namespace", value_name = "PREFIX")]
    exclude_namespaces: Vec<String>,

    /// Compute and report changes without writing files
    #[arg(long)]
    dry_run: bool,

    /// Print parsed mappings as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Append every status line to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Debug-level diagnostics on stderr
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let project = validate_project(&cli.project)?;
    let mut config = config::load(&project, cli.config.as_deref())?;
    config
        .sync
        .exclude_namespaces
        .extend(cli.exclude_namespaces.iter().cloned());
    config.sync.dry_run = cli.dry_run;

    let files = scan_project(&project, &config.sync);
    let documents = load_mappings(&files, &FsStore);

    if cli.dump {
        return dump(&documents);
    }

    let table = load_artifacts(&files, &FsStore, &config.sync);
    let log = match (&cli.log_file, &config.log_dir) {
        (Some(path), _) => Some(RunLog::open(path)?),
        (None, Some(dir)) => Some(RunLog::daily(dir)?),
        (None, None) => None,
    };

    if !cli.quiet {
        println!(
            "{} {} ({} mapping file(s), {} class/trait file(s){})",
            "Synchronizing".green().bold(),
            project.display(),
            documents.len(),
            table.len(),
            if config.sync.dry_run { ", dry run" } else { "" }
        );
    }

    let mut sink = ConsoleSink::new(cli.quiet, log);
    let summary = Synchronizer::new(&table, &FsStore, &config.sync).run(&documents, &mut sink);
    sink.summary(&summary);

    // Per-entity failures are reported above, not turned into an exit status.
    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_project(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        bail!("no project directory given");
    }
    if !path.exists() {
        bail!("project directory {} does not exist", path.display());
    }
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    Ok(path.to_path_buf())
}

fn dump(documents: &[MappingDocument]) -> Result<()> {
    let entries: Vec<serde_json::Value> = documents
        .iter()
        .map(|document| match document.parse() {
            Ok(entity) => serde_json::json!({ "file": document.label, "entity": entity }),
            Err(err) => serde_json::json!({ "file": document.label, "error": err.to_string() }),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
