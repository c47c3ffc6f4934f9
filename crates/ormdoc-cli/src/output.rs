//! Operator-facing output: colored console lines and the run log.

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use ormdoc_sync::{BatchSummary, Level, StatusSink};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const RULE: &str =
    "==============================================================================";

/// Append-only log of every status line of every run.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// `<dir>/YYYY_MM_DD.log` for today.
    pub fn daily(dir: &Path) -> Result<Self> {
        Self::open(&dir.join(daily_file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, level: Level, message: &str) -> io::Result<()> {
        writeln!(self.file, "{RULE}")?;
        writeln!(
            self.file,
            "[{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level_name(level)
        )?;
        writeln!(self.file, "{message}")
    }
}

pub fn daily_file_name() -> String {
    format!("{}.log", Local::now().format("%Y_%m_%d"))
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Info => "INFO",
        Level::Success => "SUCCESS",
        Level::Warning => "WARNING",
        Level::Error => "ERROR",
    }
}

/// Status sink for the terminal, mirrored into an optional run log.
pub struct ConsoleSink {
    quiet: bool,
    log: Option<RunLog>,
}

impl ConsoleSink {
    pub fn new(quiet: bool, log: Option<RunLog>) -> Self {
        Self { quiet, log }
    }

    pub fn summary(&mut self, summary: &BatchSummary) {
        let counts = format!(
            "{} {}, {} unchanged, {} failed",
            summary.patched(),
            if summary.dry_run { "would change" } else { "patched" },
            summary.unchanged(),
            summary.failed()
        );

        if summary.failed() == 0 {
            println!("{} {}", "done".green().bold(), counts);
            self.record(Level::Success, &format!("done: {counts}"));
        } else {
            let failed = summary.failed_entities().join(", ");
            println!("{} {}", "done".yellow().bold(), counts);
            eprintln!("{} {}", "failed:".red().bold(), failed);
            self.record(Level::Warning, &format!("done: {counts}\nfailed: {failed}"));
        }
    }

    fn record(&mut self, level: Level, message: &str) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        if let Err(err) = log.append(level, message) {
            tracing::warn!(path = %log.path().display(), error = %err, "cannot write run log; disabling it");
            self.log = None;
        }
    }
}

impl StatusSink for ConsoleSink {
    fn emit(&mut self, level: Level, message: &str) {
        match level {
            Level::Info if !self.quiet => println!("{} {}", "info".cyan().bold(), message),
            Level::Success if !self.quiet => println!("{} {}", "ok".green().bold(), message),
            Level::Warning => eprintln!("{} {}", "warn".yellow().bold(), message),
            Level::Error => eprintln!("{} {}", "error".red().bold(), message),
            _ => {}
        }
        self.record(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn log_entries_are_appended_with_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/run.log");

        let mut log = RunLog::open(&path).unwrap();
        log.append(Level::Info, "File #1 of 2: A.orm.xml").unwrap();
        log.append(Level::Error, "App\\Entity\\B: no source file declares entity App\\Entity\\B")
            .unwrap();
        drop(log);

        let mut log = RunLog::open(&path).unwrap();
        log.append(Level::Success, "second run").unwrap();
        drop(log);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(RULE).count(), 3);
        assert!(text.contains("] ERROR\nApp\\Entity\\B: no source file"));
        assert!(text.trim_end().ends_with("second run"));
    }

    #[test]
    fn daily_log_name_has_date_shape() {
        let name = daily_file_name();
        assert_eq!(name.len(), "2024_01_31.log".len());
        assert!(name.ends_with(".log"));
        assert_eq!(name.matches('_').count(), 2);
    }
}
