//! ormdoc batch synchronization
//!
//! Drives one run over a project:
//!
//! ```text
//!   mapping documents ──► EntityDescriptor ──► owner lookup (ArtifactTable)
//!                                                   │
//!          callbacks (hierarchy walk) ◄─────────────┤
//!          fields ◄─────────────────────────────────┤
//!          class block ◄────────────────────────────┘
//!                     │
//!                     ▼
//!            changed buffers ──► SourceStore::write
//! ```
//!
//! Each mapping document is processed in isolation: whatever goes wrong with
//! one of them ends up in its [`FileReport`] and the batch moves on.

pub mod discover;
pub mod options;
pub mod report;
pub mod store;
pub mod synchronizer;


pub use discover::{load_artifacts, load_mappings, scan_project, ProjectFiles};
pub use options::SyncOptions;
pub use report::{BatchSummary, EntityReport, FileReport, Level, StatusSink};
pub use store::{FsStore, MemoryStore, SourceStore};
pub use synchronizer::{DocumentKind, MappingDocument, Synchronizer};

use ormdoc_mapping::MappingError;
use ormdoc_source::PatchError;
use std::path::PathBuf;
use thiserror::Error;

/// Why one mapping document could not be synchronized.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid mapping: {0}")]
    Mapping(#[from] MappingError),

    #[error("no source file declares entity {entity}")]
    UnresolvedOwner { entity: String },

    #[error("cannot patch {}: {source}", path.display())]
    Patch {
        path: PathBuf,
        #[source]
        source: PatchError,
    },

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
