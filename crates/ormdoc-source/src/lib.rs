//! Source-side half of ormdoc
//!
//! - [`patterns`]: single-line matchers for declarations, imports and doc blocks
//! - [`SourceArtifact`]: what one file declares (type, namespace, imports,
//!   traits, supertype, methods), scanned without a parser
//! - [`ArtifactTable`]: every artifact of a project, hierarchy links resolved,
//!   and the walk that finds which file really declares a method
//! - [`SourceText`]: in-memory file text and the doc-block patch operations

pub mod artifact;
pub mod hierarchy;
pub mod patcher;
pub mod patterns;

pub use artifact::{ArtifactKind, SourceArtifact};
pub use hierarchy::{ArtifactId, ArtifactTable};
pub use patcher::{PatchAction, PatchOutcome, SourceText};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("supertype chain of {artifact} loops back to {repeated}")]
    Cycle { artifact: String, repeated: String },
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("no class or trait declaration found")]
    NoTypeDeclaration,

    #[error("method `{method}` not found")]
    MethodNotFound { method: String },
}
