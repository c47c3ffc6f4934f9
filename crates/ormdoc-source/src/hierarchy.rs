//! The artifact table and the class-hierarchy walk over it.
//!
//! Artifacts are stored once, in scan order, and addressed by [`ArtifactId`].
//! Supertype and trait links are ids into the same table, resolved after
//! every file is known, so a supertype discovered later than its subclass
//! still links up. A link to something outside the table (vendor code, an
//! excluded namespace) is simply absent.

use crate::{ArtifactKind, HierarchyError, SourceArtifact};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(usize);

impl ArtifactId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct Links {
    supertype: Option<ArtifactId>,
    traits: Vec<ArtifactId>,
}

/// Read-only table of every discovered artifact plus its hierarchy links.
#[derive(Debug, Clone, Default)]
pub struct ArtifactTable {
    artifacts: Vec<SourceArtifact>,
    links: Vec<Links>,
    /// Lowercased fully-qualified name -> id.
    by_name: HashMap<String, ArtifactId>,
}

impl ArtifactTable {
    /// Register every classified artifact outside `excluded_namespaces`, then
    /// link supertypes and traits.
    pub fn build(artifacts: Vec<SourceArtifact>, excluded_namespaces: &[String]) -> Self {
        let exclusions: Vec<String> = excluded_namespaces
            .iter()
            .map(|prefix| normalize(prefix))
            .filter(|prefix| !prefix.is_empty())
            .collect();

        let mut table = ArtifactTable::default();
        for artifact in artifacts {
            if artifact.kind == ArtifactKind::Inert {
                continue;
            }
            let Some(fqn) = artifact.fqn() else {
                continue;
            };
            let key = normalize(&fqn);
            if exclusions.iter().any(|prefix| key.starts_with(prefix.as_str())) {
                tracing::debug!(artifact = %fqn, "excluded namespace");
                continue;
            }
            if let Some(existing) = table.by_name.get(&key) {
                tracing::warn!(
                    artifact = %fqn,
                    kept = %table.artifacts[existing.0].path.display(),
                    ignored = %artifact.path.display(),
                    "type declared in more than one file"
                );
                continue;
            }

            let id = ArtifactId(table.artifacts.len());
            table.by_name.insert(key, id);
            table.artifacts.push(artifact);
            table.links.push(Links::default());
        }

        for index in 0..table.artifacts.len() {
            let artifact = &table.artifacts[index];
            let supertype = artifact
                .supertype
                .as_deref()
                .and_then(|name| table.lookup(name));
            let traits = artifact
                .traits
                .iter()
                .filter_map(|name| table.lookup(name))
                .collect();
            table.links[index] = Links { supertype, traits };
        }

        tracing::debug!(artifacts = table.artifacts.len(), "artifact table built");
        table
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn get(&self, id: ArtifactId) -> &SourceArtifact {
        &self.artifacts[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactId, &SourceArtifact)> {
        self.artifacts
            .iter()
            .enumerate()
            .map(|(index, artifact)| (ArtifactId(index), artifact))
    }

    /// Look an artifact up by fully-qualified name (case-insensitive, a
    /// leading `\` is ignored).
    pub fn lookup(&self, fqn: &str) -> Option<ArtifactId> {
        self.by_name.get(&normalize(fqn)).copied()
    }

    pub fn supertype(&self, id: ArtifactId) -> Option<ArtifactId> {
        self.links[id.0].supertype
    }

    pub fn traits(&self, id: ArtifactId) -> &[ArtifactId] {
        &self.links[id.0].traits
    }

    /// Find the artifact whose text declares `method`, starting at `root`.
    ///
    /// Each level of the supertype chain is searched as: the artifact itself,
    /// then its traits in declaration order (and their traits, depth first).
    /// A trait reachable along several paths is searched once. Revisiting a
    /// level of the supertype chain is a [`HierarchyError::Cycle`].
    pub fn find_declaring_artifact(
        &self,
        root: ArtifactId,
        method: &str,
    ) -> Result<Option<ArtifactId>, HierarchyError> {
        let mut chain = HashSet::new();
        let mut searched_traits = HashSet::new();
        let mut current = Some(root);

        while let Some(id) = current {
            if !chain.insert(id) {
                return Err(HierarchyError::Cycle {
                    artifact: self.name_of(root),
                    repeated: self.name_of(id),
                });
            }
            if let Some(found) = self.search_level(id, method, &mut searched_traits) {
                return Ok(Some(found));
            }
            current = self.supertype(id);
        }

        Ok(None)
    }

    fn search_level(
        &self,
        id: ArtifactId,
        method: &str,
        searched_traits: &mut HashSet<ArtifactId>,
    ) -> Option<ArtifactId> {
        if self.get(id).declares_method(method) {
            return Some(id);
        }
        for &used in self.traits(id) {
            if !searched_traits.insert(used) {
                continue;
            }
            if let Some(found) = self.search_level(used, method, searched_traits) {
                return Some(found);
            }
        }
        None
    }

    fn name_of(&self, id: ArtifactId) -> String {
        self.get(id).fqn().unwrap_or_default()
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_start_matches('\\').to_ascii_lowercase()
}
