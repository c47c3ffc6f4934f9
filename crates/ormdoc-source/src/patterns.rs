//! Line patterns for PHP-like class sources.
//!
//! There is no parser here. Each matcher looks at exactly one line and either
//! recognizes a declaration header or does not; doc blocks are found by
//! walking upwards from a recognized header. Every pattern is anchored at the
//! start of the line, so text inside comments (` * class Foo`) and mid-line
//! keywords (`new class`, `function () use ($x)`) never match.

use regex::Regex;
use std::sync::OnceLock;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            CELL.get_or_init(|| Regex::new($pattern).expect("static pattern compiles"))
        }
    };
}

static_regex!(
    type_declaration_re,
    r"^\s*(?:(?:abstract|final|readonly)\s+)*(class|trait)\s+([A-Za-z_][A-Za-z0-9_]*)"
);
static_regex!(
    namespace_re,
    r"^\s*namespace\s+\\?([A-Za-z_][A-Za-z0-9_\\]*)\s*[;{]"
);
static_regex!(use_re, r"^\s*use\s+([^;{]+?)\s*(?:;|\{)");
static_regex!(declare_re, r"^\s*(?:<\?php\s+)?declare\s*\(");
static_regex!(group_use_re, r"^\s*use\s+([A-Za-z0-9_\\]+)\\\{([^}]*)\}\s*;");
static_regex!(extends_re, r"\bextends\s+(\\?[A-Za-z_][A-Za-z0-9_\\]*)");
static_regex!(
    method_re,
    r"^\s*(?:(?:public|protected|private|static|final|abstract)\s+)*function\s+&?\s*([A-Za-z_][A-Za-z0-9_]*)\s*\("
);
static_regex!(
    property_re,
    r"^\s*(?:(?:public|protected|private|var|static|readonly)\s+)+(?:\??[A-Za-z_\\][A-Za-z0-9_\\|]*\s+)?\$([A-Za-z_][A-Za-z0-9_]*)\b"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Class,
    Trait,
}

/// `final class Book extends Base` -> `(Class, "Book")`.
pub fn type_declaration(line: &str) -> Option<(DeclarationKind, &str)> {
    let caps = type_declaration_re().captures(line)?;
    let kind = match caps.get(1)?.as_str() {
        "class" => DeclarationKind::Class,
        _ => DeclarationKind::Trait,
    };
    Some((kind, caps.get(2)?.as_str()))
}

/// `namespace App\Entity;` -> `App\Entity`.
pub fn namespace(line: &str) -> Option<&str> {
    namespace_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The clause of a `use ...;` statement, without the keyword.
///
/// A closure's captured-variable list (`use ($x) {` on its own line) is not
/// an import.
pub fn use_clause(line: &str) -> Option<&str> {
    use_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|clause| !clause.starts_with('('))
}

/// `declare(strict_types=1);`, alone or right after `<?php`.
pub fn is_declare(line: &str) -> bool {
    declare_re().is_match(line)
}

/// Net `{` minus `}` on a line.
pub fn brace_delta(line: &str) -> isize {
    line.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

/// `class A extends Base\Model` -> `Base\Model`.
pub fn extends_name(line: &str) -> Option<&str> {
    extends_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `public function onSave(): void` -> `onSave`.
pub fn method_name(line: &str) -> Option<&str> {
    method_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `private ?string $title = null;` -> `title`.
pub fn property_name(line: &str) -> Option<&str> {
    property_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Expand a top-level import line into `(alias, fully-qualified name)` pairs.
///
/// Handles `use A\B;`, `use A\B as C;`, `use A\B, C\D;` and group imports
/// `use A\{B, C as D};`. Function and constant imports yield nothing.
pub fn imports(line: &str) -> Vec<(String, String)> {
    if let Some(caps) = group_use_re().captures(line) {
        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let items = caps.get(2).map_or("", |m| m.as_str());
        return items
            .split(',')
            .filter_map(|item| import_item(&format!("{prefix}\\{}", item.trim())))
            .collect();
    }

    let Some(clause) = use_clause(line) else {
        return Vec::new();
    };
    if clause.starts_with("function ") || clause.starts_with("const ") {
        return Vec::new();
    }
    clause.split(',').filter_map(import_item).collect()
}

fn import_item(item: &str) -> Option<(String, String)> {
    let item = item.trim();
    if item.is_empty() {
        return None;
    }
    let (name, alias) = match split_alias(item) {
        Some((name, alias)) => (name, alias.to_string()),
        None => (item, last_segment(item).to_string()),
    };
    let name = name.trim().trim_start_matches('\\');
    if name.is_empty() || alias.is_empty() {
        return None;
    }
    Some((alias, name.to_string()))
}

fn split_alias(item: &str) -> Option<(&str, &str)> {
    let lower = item.to_ascii_lowercase();
    let at = lower.find(" as ")?;
    Some((item[..at].trim(), item[at + 4..].trim()))
}

pub fn last_segment(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// Names listed in a trait `use A, B;` (or `use A, B { ... }`) statement.
pub fn trait_names(line: &str) -> Vec<&str> {
    use_clause(line)
        .map(|clause| {
            clause
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Doc blocks
// ============================================================================

/// Inclusive line range of a `/** ... */` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocSpan {
    pub start: usize,
    pub end: usize,
}

impl DocSpan {
    pub fn is_single_line(&self) -> bool {
        self.start == self.end
    }
}

/// The documentation block directly above `anchor`, if any.
///
/// Only blank lines may separate the block from the anchor. Walking upwards
/// from the closing `*/`, every line must be a `*` continuation until the
/// opening `/**`; anything else (code, a plain `/* */` comment) means the
/// anchor has no doc block of its own.
pub fn doc_block_above<S: AsRef<str>>(lines: &[S], anchor: usize) -> Option<DocSpan> {
    let mut cursor = anchor.min(lines.len());
    while cursor > 0 && lines[cursor - 1].as_ref().trim().is_empty() {
        cursor -= 1;
    }
    if cursor == 0 {
        return None;
    }

    let end = cursor - 1;
    let closing = lines[end].as_ref().trim();
    if !closing.ends_with("*/") {
        return None;
    }
    if closing.starts_with("/**") {
        return Some(DocSpan { start: end, end });
    }
    if closing.starts_with("/*") {
        return None;
    }

    let mut line = end;
    while line > 0 {
        line -= 1;
        let text = lines[line].as_ref().trim();
        if text.starts_with("/**") {
            return Some(DocSpan { start: line, end });
        }
        if !text.starts_with('*') || text.ends_with("*/") {
            return None;
        }
    }
    None
}

/// Whether any line contains `annotation` as a whole name
/// (`@ORM\PrePersist` matches `@ORM\PrePersist()` but not `@ORM\PrePersistX`).
pub fn contains_annotation<S: AsRef<str>>(lines: &[S], annotation: &str) -> bool {
    lines.iter().any(|line| {
        let line = line.as_ref();
        line.match_indices(annotation).any(|(at, found)| {
            line[at + found.len()..]
                .chars()
                .next()
                .map_or(true, |next| !(next.is_alphanumeric() || next == '_'))
        })
    })
}

pub fn indentation(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}
