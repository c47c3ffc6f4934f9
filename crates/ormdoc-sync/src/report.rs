//! Per-file outcomes and the operator status stream.

use crate::SyncError;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives one status line per event of a run.
pub trait StatusSink {
    fn emit(&mut self, level: Level, message: &str);
}

impl StatusSink for Vec<(Level, String)> {
    fn emit(&mut self, level: Level, message: &str) {
        self.push((level, message.to_string()));
    }
}

/// What happened to one entity that was synchronized successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityReport {
    pub entity: String,
    /// File declaring the entity class.
    pub owner: PathBuf,
    pub fields_patched: usize,
    pub callbacks_patched: usize,
    pub class_patched: bool,
    /// Callback methods that could not be located.
    pub skipped_callbacks: Vec<String>,
    pub warnings: Vec<String>,
    /// Files whose text changed (written unless the run is a dry run).
    pub changed_files: Vec<PathBuf>,
}

impl EntityReport {
    pub fn is_unchanged(&self) -> bool {
        self.changed_files.is_empty()
    }
}

#[derive(Debug)]
pub struct FileReport {
    /// 1-based position in the batch.
    pub index: usize,
    pub label: String,
    /// Entity class name, when the mapping got far enough to name one.
    pub entity: Option<String>,
    pub outcome: Result<EntityReport, SyncError>,
}

impl FileReport {
    /// Entity name, falling back to the document label.
    pub fn subject(&self) -> &str {
        self.entity.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<FileReport>,
    pub dry_run: bool,
}

impl BatchSummary {
    pub fn patched(&self) -> usize {
        self.successes().filter(|report| !report.is_unchanged()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.successes().filter(|report| report.is_unchanged()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|file| file.outcome.is_err()).count()
    }

    pub fn failed_entities(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|file| file.outcome.is_err())
            .map(FileReport::subject)
            .collect()
    }

    fn successes(&self) -> impl Iterator<Item = &EntityReport> {
        self.reports
            .iter()
            .filter_map(|file| file.outcome.as_ref().ok())
    }
}
