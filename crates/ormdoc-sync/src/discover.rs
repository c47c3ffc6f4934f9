//! Project discovery: which files are mappings, which are sources.

use crate::options::SyncOptions;
use crate::store::SourceStore;
use crate::synchronizer::MappingDocument;
use ormdoc_source::{ArtifactTable, SourceArtifact};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    pub root: PathBuf,
    pub mappings: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
}

/// Walk `root` (sorted by file name, so runs are reproducible) and sort the
/// files into mappings and sources.
pub fn scan_project(root: &Path, options: &SyncOptions) -> ProjectFiles {
    let mut files = ProjectFiles {
        root: root.to_path_buf(),
        ..ProjectFiles::default()
    };

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() || entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !options.exclude_dirs.iter().any(|skip| name == skip.as_str())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let is_mapping = entry
            .file_name()
            .to_string_lossy()
            .ends_with(options.mapping_suffix.as_str());
        let is_source = entry
            .path()
            .extension()
            .map_or(false, |ext| ext == options.source_extension.as_str());

        if is_mapping {
            files.mappings.push(entry.into_path());
        } else if is_source {
            files.sources.push(entry.into_path());
        }
    }

    tracing::debug!(
        root = %root.display(),
        mappings = files.mappings.len(),
        sources = files.sources.len(),
        "project scanned"
    );
    files
}

/// Read every mapping file; unreadable ones are logged and left out.
pub fn load_mappings<S: SourceStore + ?Sized>(
    files: &ProjectFiles,
    store: &S,
) -> Vec<MappingDocument> {
    files
        .mappings
        .iter()
        .filter_map(|path| match store.read(path) {
            Ok(text) => Some(MappingDocument::xml(relative_label(&files.root, path), text)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read mapping");
                None
            }
        })
        .collect()
}

/// Scan every source file and link the hierarchy.
pub fn load_artifacts<S: SourceStore + ?Sized>(
    files: &ProjectFiles,
    store: &S,
    options: &SyncOptions,
) -> ArtifactTable {
    let artifacts = files
        .sources
        .iter()
        .filter_map(|path| match store.read(path) {
            Ok(text) => Some(SourceArtifact::scan(path, &text)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read source");
                None
            }
        })
        .collect();
    ArtifactTable::build(artifacts, &options.exclude_namespaces)
}

fn relative_label(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
