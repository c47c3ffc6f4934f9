use serde::{Deserialize, Serialize};

/// Knobs for one synchronization run.
///
/// Deserializes from the project's JSON config; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Namespace prefixes never patched nor traversed (vendor code).
    pub exclude_namespaces: Vec<String>,
    /// `ORM` renders `@ORM\Column(...)`.
    pub annotation_alias: String,
    /// Namespace the alias is imported from.
    pub mapping_import: String,
    /// Add `use <mapping_import> as <alias>;` to patched files lacking it.
    pub ensure_mapping_import: bool,
    pub mapping_suffix: String,
    pub source_extension: String,
    /// Directory names skipped during discovery.
    pub exclude_dirs: Vec<String>,
    /// Compute and report changes without writing them.
    #[serde(skip)]
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            exclude_namespaces: Vec::new(),
            annotation_alias: ormdoc_mapping::DEFAULT_ALIAS.to_string(),
            mapping_import: "Doctrine\\ORM\\Mapping".to_string(),
            ensure_mapping_import: true,
            mapping_suffix: ".orm.xml".to_string(),
            source_extension: "php".to_string(),
            exclude_dirs: vec![".git".to_string(), "node_modules".to_string()],
            dry_run: false,
        }
    }
}
