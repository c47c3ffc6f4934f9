use crate::report::{BatchSummary, EntityReport, FileReport, Level, StatusSink};
use crate::store::SourceStore;
use crate::{SyncError, SyncOptions};
use ormdoc_mapping::{parse_mapping_xml, EntityDescriptor, MappingError};
use ormdoc_source::{ArtifactId, ArtifactTable, PatchError, SourceText};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Format of a mapping document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    #[default]
    Xml,
}

/// One mapping document as handed over by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDocument {
    /// Shown to the operator; usually the path relative to the project.
    pub label: String,
    pub kind: DocumentKind,
    pub text: String,
}

impl MappingDocument {
    pub fn xml(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: DocumentKind::Xml,
            text: text.into(),
        }
    }

    pub fn parse(&self) -> Result<EntityDescriptor, MappingError> {
        match self.kind {
            DocumentKind::Xml => parse_mapping_xml(&self.text),
        }
    }
}

/// A source file loaded for patching.
struct Buffer {
    path: PathBuf,
    original: String,
    source: SourceText,
}

impl Buffer {
    fn changed(&self) -> bool {
        self.source.render() != self.original
    }
}

/// Runs mapping documents against a read-only artifact table.
pub struct Synchronizer<'a, S: SourceStore + ?Sized> {
    table: &'a ArtifactTable,
    store: &'a S,
    options: &'a SyncOptions,
}

impl<'a, S: SourceStore + ?Sized> Synchronizer<'a, S> {
    pub fn new(table: &'a ArtifactTable, store: &'a S, options: &'a SyncOptions) -> Self {
        Self {
            table,
            store,
            options,
        }
    }

    /// Synchronize every document in order. Never fails as a whole: each
    /// document's outcome lands in its own [`FileReport`].
    pub fn run(&self, documents: &[MappingDocument], sink: &mut dyn StatusSink) -> BatchSummary {
        let total = documents.len();
        let mut summary = BatchSummary {
            reports: Vec::with_capacity(total),
            dry_run: self.options.dry_run,
        };

        for (offset, document) in documents.iter().enumerate() {
            let index = offset + 1;
            sink.emit(
                Level::Info,
                &format!("File #{index} of {total}: {}", document.label),
            );

            let mut entity_name = None;
            let outcome = document
                .parse()
                .map_err(SyncError::from)
                .and_then(|entity| {
                    entity_name = Some(entity.class_name.clone());
                    self.sync_entity(&entity)
                });

            let report = FileReport {
                index,
                label: document.label.clone(),
                entity: entity_name,
                outcome,
            };
            self.announce(&report, sink);
            summary.reports.push(report);
        }

        summary
    }

    fn announce(&self, report: &FileReport, sink: &mut dyn StatusSink) {
        match &report.outcome {
            Ok(entity) => {
                for warning in &entity.warnings {
                    sink.emit(Level::Warning, &format!("{}: {warning}", entity.entity));
                }
                let message = if entity.is_unchanged() {
                    format!("{}: already up to date", entity.entity)
                } else if self.options.dry_run {
                    format!(
                        "{}: would update {}",
                        entity.entity,
                        display_paths(&entity.changed_files)
                    )
                } else {
                    format!(
                        "{}: updated {}",
                        entity.entity,
                        display_paths(&entity.changed_files)
                    )
                };
                sink.emit(Level::Success, &message);
            }
            Err(err) => {
                tracing::warn!(
                    file = %report.label,
                    entity = %report.subject(),
                    error = %err,
                    "mapping failed"
                );
                sink.emit(Level::Error, &format!("{}: {err}", report.subject()));
            }
        }
    }

    /// Patch callbacks, fields and the class block of one entity, then
    /// persist every buffer that changed.
    pub fn sync_entity(&self, entity: &EntityDescriptor) -> Result<EntityReport, SyncError> {
        let owner = self
            .table
            .lookup(&entity.class_name)
            .ok_or_else(|| SyncError::UnresolvedOwner {
                entity: entity.class_name.clone(),
            })?;

        let alias = self.options.annotation_alias.as_str();
        let mut buffers: BTreeMap<ArtifactId, Buffer> = BTreeMap::new();
        let mut report = EntityReport {
            entity: entity.class_name.clone(),
            owner: self.table.get(owner).path.clone(),
            ..EntityReport::default()
        };

        for callback in &entity.callbacks {
            let declaring = match self.table.find_declaring_artifact(owner, &callback.method) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    self.skip_callback(
                        &mut report,
                        &callback.method,
                        "not declared in the class hierarchy",
                    );
                    continue;
                }
                Err(err) => {
                    self.skip_callback(&mut report, &callback.method, &err.to_string());
                    continue;
                }
            };

            let buffer = self.buffer(&mut buffers, declaring)?;
            match buffer
                .source
                .patch_callback(&callback.method, &callback.annotation(alias))
            {
                Ok(action) => {
                    if action.changed() {
                        report.callbacks_patched += 1;
                    }
                }
                Err(PatchError::MethodNotFound { .. }) => {
                    let reason = format!("not found in {}", buffer.path.display());
                    self.skip_callback(&mut report, &callback.method, &reason);
                }
                Err(source) => {
                    return Err(SyncError::Patch {
                        path: buffer.path.clone(),
                        source,
                    })
                }
            }
        }

        let buffer = self.buffer(&mut buffers, owner)?;
        for field in &entity.fields {
            let outcome = buffer
                .source
                .patch_field(&field.name, &field.annotation_lines(alias))
                .map_err(|source| SyncError::Patch {
                    path: buffer.path.clone(),
                    source,
                })?;
            if outcome.action.changed() {
                report.fields_patched += 1;
            }
            for warning in outcome.warnings {
                tracing::warn!(entity = %entity.class_name, field = %field.name, "{warning}");
                report.warnings.push(warning);
            }
        }

        let action = buffer
            .source
            .patch_class(&entity.class_annotation_lines(alias))
            .map_err(|source| SyncError::Patch {
                path: buffer.path.clone(),
                source,
            })?;
        report.class_patched = action.changed();

        if self.options.ensure_mapping_import {
            for (id, buffer) in buffers.iter_mut() {
                if *id == owner || buffer.changed() {
                    buffer
                        .source
                        .ensure_import(&self.options.mapping_import, alias);
                }
            }
        }

        for buffer in buffers.values() {
            if !buffer.changed() {
                continue;
            }
            if !self.options.dry_run {
                self.store
                    .write(&buffer.path, &buffer.source.render())
                    .map_err(|source| SyncError::Io {
                        path: buffer.path.clone(),
                        source,
                    })?;
                tracing::debug!(path = %buffer.path.display(), "written");
            }
            report.changed_files.push(buffer.path.clone());
        }

        Ok(report)
    }

    fn buffer<'b>(
        &self,
        buffers: &'b mut BTreeMap<ArtifactId, Buffer>,
        id: ArtifactId,
    ) -> Result<&'b mut Buffer, SyncError> {
        match buffers.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.table.get(id).path.clone();
                let original = self.store.read(&path).map_err(|source| SyncError::Io {
                    path: path.clone(),
                    source,
                })?;
                let source = SourceText::parse(&original);
                Ok(entry.insert(Buffer {
                    path,
                    original,
                    source,
                }))
            }
        }
    }

    fn skip_callback(&self, report: &mut EntityReport, method: &str, reason: &str) {
        tracing::warn!(entity = %report.entity, method, reason, "callback skipped");
        report.skipped_callbacks.push(method.to_string());
        report
            .warnings
            .push(format!("callback {method}() skipped: {reason}"));
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
