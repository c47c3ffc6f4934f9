//! Structural facts about one source file, extracted line by line.

use crate::patterns::{self, DeclarationKind};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Class,
    Trait,
    /// No class or trait declaration; carries no further metadata.
    Inert,
}

/// One discovered source file.
///
/// Names held here (`traits`, `supertype`) are already qualified against the
/// file's own imports and namespace; turning them into links to other
/// artifacts happens in [`crate::ArtifactTable::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub namespace: Option<String>,
    pub short_name: Option<String>,
    /// Top-level imports: alias -> fully-qualified name.
    pub imports: BTreeMap<String, String>,
    /// Traits used inside the type body, in declaration order.
    pub traits: Vec<String>,
    pub supertype: Option<String>,
    pub declaration_line: Option<usize>,
    /// Declared method names, lowercased.
    pub methods: BTreeSet<String>,
}

impl SourceArtifact {
    pub fn scan(path: impl AsRef<Path>, text: &str) -> Self {
        let mut artifact = SourceArtifact {
            path: path.as_ref().to_path_buf(),
            kind: ArtifactKind::Inert,
            namespace: None,
            short_name: None,
            imports: BTreeMap::new(),
            traits: Vec::new(),
            supertype: None,
            declaration_line: None,
            methods: BTreeSet::new(),
        };

        let lines: Vec<&str> = text.lines().collect();
        let Some(declaration) = lines
            .iter()
            .position(|line| patterns::type_declaration(line).is_some())
        else {
            return artifact;
        };

        for line in &lines[..declaration] {
            if let Some(namespace) = patterns::namespace(line) {
                artifact.namespace = Some(namespace.to_string());
            }
            for (alias, name) in patterns::imports(line) {
                artifact.imports.insert(alias, name);
            }
        }

        if let Some((kind, name)) = patterns::type_declaration(lines[declaration]) {
            artifact.kind = match kind {
                DeclarationKind::Class => ArtifactKind::Class,
                DeclarationKind::Trait => ArtifactKind::Trait,
            };
            artifact.short_name = Some(name.to_string());
        }
        artifact.declaration_line = Some(declaration);

        // The `extends` clause may wrap onto the lines before the opening brace.
        let header_end = lines[declaration..]
            .iter()
            .position(|line| line.contains('{'))
            .map_or(declaration, |offset| declaration + offset);
        let extended = lines[declaration..=header_end]
            .iter()
            .find_map(|line| patterns::extends_name(line));
        if artifact.kind == ArtifactKind::Class {
            artifact.supertype = extended.map(|name| artifact.qualify(name));
        }

        // Members sit at depth 1; closures and anonymous classes nest deeper.
        let mut depth: isize = 0;
        let mut opened = false;
        for (index, line) in lines.iter().enumerate().skip(declaration) {
            if depth == 1 && index > declaration {
                if let Some(method) = patterns::method_name(line) {
                    artifact.methods.insert(method.to_ascii_lowercase());
                } else if patterns::use_clause(line).is_some() {
                    let names: Vec<String> = patterns::trait_names(line)
                        .into_iter()
                        .map(|name| artifact.qualify(name))
                        .collect();
                    artifact.traits.extend(names);
                }
            }
            depth += patterns::brace_delta(line);
            opened |= depth > 0;
            if opened && depth <= 0 {
                break;
            }
        }

        artifact
    }

    pub fn is_inert(&self) -> bool {
        self.kind == ArtifactKind::Inert
    }

    /// `App\Entity\Book`, or `None` for inert files.
    pub fn fqn(&self) -> Option<String> {
        let short = self.short_name.as_deref()?;
        Some(match self.namespace.as_deref() {
            Some(namespace) if !namespace.is_empty() => format!("{namespace}\\{short}"),
            _ => short.to_string(),
        })
    }

    /// Whether the file's text declares `method` (case-insensitively).
    pub fn declares_method(&self, method: &str) -> bool {
        self.methods.contains(&method.to_ascii_lowercase())
    }

    /// Resolve a name as written in this file to a fully-qualified name.
    ///
    /// A leading `\` is already qualified; a first segment matching an
    /// import alias expands through the import; anything else is relative to
    /// the file's namespace.
    pub fn qualify(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }

        let (head, rest) = match name.split_once('\\') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        let imported = self
            .imports
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(head))
            .map(|(_, target)| target);

        match (imported, rest) {
            (Some(target), Some(rest)) => format!("{target}\\{rest}"),
            (Some(target), None) => target.clone(),
            (None, _) => match self.namespace.as_deref() {
                Some(namespace) if !namespace.is_empty() => format!("{namespace}\\{name}"),
                _ => name.to_string(),
            },
        }
    }
}
