//! Line-oriented doc-block patching.
//!
//! A [`SourceText`] is the file split into lines, each with its own
//! terminator, so an untouched file renders back byte for byte. Every
//! operation re-locates its anchor from scratch, so operations compose in any
//! order and earlier edits never leave stale line numbers behind.
//!
//! Three anchors are supported:
//! - a property, by name ([`SourceText::patch_field`])
//! - the type declaration ([`SourceText::patch_class`])
//! - a method, by name ([`SourceText::patch_callback`])

use crate::patterns::{self, DocSpan};
use crate::PatchError;
use std::ops::Range;

const MEMBER_INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    Unchanged,
    /// An existing doc block was rewritten.
    Replaced,
    /// A doc block was added above an existing declaration.
    Inserted,
    /// A property declaration was created together with its doc block.
    Synthesized,
    /// An annotation line was added to an existing doc block.
    Merged,
}

impl PatchAction {
    pub fn changed(self) -> bool {
        self != PatchAction::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub action: PatchAction,
    /// Non-fatal problems noticed while patching.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    lines: Vec<String>,
    /// Terminator of each line as read; empty for an unterminated last line.
    terminators: Vec<&'static str>,
    /// Dominant terminator, used for inserted lines.
    eol: &'static str,
}

impl SourceText {
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut terminators = Vec::new();
        for piece in text.split_inclusive('\n') {
            let (line, terminator) = if let Some(line) = piece.strip_suffix("\r\n") {
                (line, "\r\n")
            } else if let Some(line) = piece.strip_suffix('\n') {
                (line, "\n")
            } else {
                (piece, "")
            };
            lines.push(line.to_string());
            terminators.push(terminator);
        }

        let crlf = terminators.iter().filter(|t| **t == "\r\n").count();
        let lf = terminators.iter().filter(|t| **t == "\n").count();
        SourceText {
            lines,
            terminators,
            eol: if crlf > lf { "\r\n" } else { "\n" },
        }
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        for (line, terminator) in self.lines.iter().zip(&self.terminators) {
            text.push_str(line);
            text.push_str(terminator);
        }
        text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn type_declaration_line(&self) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| patterns::type_declaration(line).is_some())
    }

    /// First property named `name` after the type declaration.
    pub fn find_property(&self, name: &str) -> Option<usize> {
        let declaration = self.type_declaration_line()?;
        self.lines
            .iter()
            .enumerate()
            .skip(declaration + 1)
            .find(|(_, line)| patterns::property_name(line) == Some(name))
            .map(|(index, _)| index)
    }

    /// First method named `name` (case-insensitive, as PHP resolves them).
    pub fn find_method(&self, name: &str) -> Option<usize> {
        let start = self.type_declaration_line().unwrap_or(0);
        self.lines
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, line)| {
                patterns::method_name(line).map_or(false, |found| found.eq_ignore_ascii_case(name))
            })
            .map(|(index, _)| index)
    }

    // ========================================================================
    // Anchors
    // ========================================================================

    /// Put `annotations` in the doc block of property `name`.
    ///
    /// An existing block is replaced; a property without one gets one; a
    /// missing property is declared (`private $name;`) at the first member
    /// line of the type body.
    pub fn patch_field(
        &mut self,
        name: &str,
        annotations: &[String],
    ) -> Result<PatchOutcome, PatchError> {
        let declaration = self
            .type_declaration_line()
            .ok_or(PatchError::NoTypeDeclaration)?;

        let mut warnings = Vec::new();
        let action = match self.find_property(name) {
            Some(line) => {
                if !is_single_line_statement(&self.lines[line]) {
                    warnings.push(format!(
                        "property ${name} (line {}) continues past its first line; only its doc block was updated",
                        line + 1
                    ));
                }
                self.place_doc_block(line, annotations)
            }
            None => {
                self.synthesize_property(declaration, name, annotations);
                PatchAction::Synthesized
            }
        };

        Ok(PatchOutcome { action, warnings })
    }

    /// Put `annotations` in the doc block directly above the type declaration.
    pub fn patch_class(&mut self, annotations: &[String]) -> Result<PatchAction, PatchError> {
        let declaration = self
            .type_declaration_line()
            .ok_or(PatchError::NoTypeDeclaration)?;
        Ok(self.place_doc_block(declaration, annotations))
    }

    /// Make sure the doc block of `method` carries `annotation`.
    ///
    /// Unlike fields, existing doc lines are kept: the annotation is added
    /// right after the opening `/**`, using the prefix of the block's first
    /// content line.
    pub fn patch_callback(
        &mut self,
        method: &str,
        annotation: &str,
    ) -> Result<PatchAction, PatchError> {
        let anchor = self
            .find_method(method)
            .ok_or_else(|| PatchError::MethodNotFound {
                method: method.to_string(),
            })?;

        let Some(span) = self.doc_block(anchor) else {
            let indent = patterns::indentation(&self.lines[anchor]).to_string();
            let block = render_doc_block(&indent, &[annotation.to_string()]);
            self.splice(anchor..anchor, block);
            return Ok(PatchAction::Inserted);
        };

        if patterns::contains_annotation(&self.lines[span.start..=span.end], annotation) {
            return Ok(PatchAction::Unchanged);
        }

        if span.is_single_line() {
            let opening = &self.lines[span.start];
            let indent = patterns::indentation(opening).to_string();
            let content = opening
                .trim()
                .trim_start_matches("/**")
                .trim_end_matches("*/")
                .trim()
                .to_string();

            let mut block = vec![format!("{indent}/**"), format!("{indent} * {annotation}")];
            if !content.is_empty() {
                block.push(format!("{indent} * {content}"));
            }
            block.push(format!("{indent} */"));
            self.splice(span.start..span.start + 1, block);
        } else {
            let prefix = continuation_prefix(&self.lines[span.start + 1]);
            self.splice(
                span.start + 1..span.start + 1,
                vec![format!("{prefix}{annotation}")],
            );
        }

        Ok(PatchAction::Merged)
    }

    /// Add `use <import> as <alias>;` to the file header unless `alias` is
    /// already imported.
    pub fn ensure_import(&mut self, import: &str, alias: &str) -> PatchAction {
        let header_end = self.type_declaration_line().unwrap_or(self.lines.len());
        let header = &self.lines[..header_end];

        let imported = header
            .iter()
            .flat_map(|line| patterns::imports(line))
            .any(|(existing, _)| existing.eq_ignore_ascii_case(alias));
        if imported {
            return PatchAction::Unchanged;
        }

        let statement = if patterns::last_segment(import).eq_ignore_ascii_case(alias) {
            format!("use {import};")
        } else {
            format!("use {import} as {alias};")
        };

        let last_use = header
            .iter()
            .rposition(|line| patterns::use_clause(line).is_some());
        let (at, block) = match last_use {
            Some(line) => (line + 1, vec![statement]),
            None => {
                // `declare(...)` has to stay the first statement of the file.
                let opening = header
                    .iter()
                    .rposition(|line| patterns::namespace(line).is_some())
                    .or_else(|| header.iter().rposition(|line| patterns::is_declare(line)))
                    .or_else(|| {
                        header
                            .iter()
                            .position(|line| line.trim_start().starts_with("<?php"))
                    });
                match opening {
                    Some(line) => (line + 1, vec![String::new(), statement]),
                    None => (0, vec![statement, String::new()]),
                }
            }
        };

        self.splice(at..at, block);
        PatchAction::Inserted
    }

    // ========================================================================
    // Shared primitives
    // ========================================================================

    fn doc_block(&self, anchor: usize) -> Option<DocSpan> {
        patterns::doc_block_above(&self.lines, anchor)
    }

    /// Replace `range` with `replacement`; false when the text already matched.
    ///
    /// New lines take the dominant terminator. An unterminated last line stays
    /// the last line without a terminator.
    fn splice(&mut self, range: Range<usize>, replacement: Vec<String>) -> bool {
        if self.lines[range.clone()] == replacement[..] {
            return false;
        }

        let at_end = range.end == self.lines.len();
        let unterminated = at_end && self.terminators.last().map_or(false, |t| t.is_empty());
        let mut terminators = vec![self.eol; replacement.len()];
        if unterminated {
            match terminators.last_mut() {
                Some(last) => {
                    *last = "";
                    if range.is_empty() {
                        self.terminators[range.start - 1] = self.eol;
                    }
                }
                None if range.start > 0 => self.terminators[range.start - 1] = "",
                None => {}
            }
        }

        self.lines.splice(range.clone(), replacement);
        self.terminators.splice(range, terminators);
        true
    }

    /// Replace the doc block above `anchor`, or insert one.
    fn place_doc_block(&mut self, anchor: usize, annotations: &[String]) -> PatchAction {
        let indent = patterns::indentation(&self.lines[anchor]).to_string();
        let block = render_doc_block(&indent, annotations);

        match self.doc_block(anchor) {
            Some(span) => {
                if self.splice(span.start..span.end + 1, block) {
                    PatchAction::Replaced
                } else {
                    PatchAction::Unchanged
                }
            }
            None => {
                self.splice(anchor..anchor, block);
                PatchAction::Inserted
            }
        }
    }

    fn synthesize_property(&mut self, declaration: usize, name: &str, annotations: &[String]) {
        let at = self.member_insertion_line(declaration);
        let indent = self.member_indent(declaration);

        let after_code = at
            .checked_sub(1)
            .and_then(|line| self.lines.get(line))
            .map_or(false, |line| {
                let line = line.trim();
                !line.is_empty() && !line.ends_with('{')
            });
        let before_code = self.lines.get(at).map_or(false, |line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('}')
        });

        let mut block = Vec::with_capacity(annotations.len() + 5);
        if after_code {
            block.push(String::new());
        }
        block.extend(render_doc_block(&indent, annotations));
        block.push(format!("{indent}private ${name};"));
        if before_code {
            block.push(String::new());
        }
        self.splice(at..at, block);
    }

    /// First line after the opening brace, or after the last trait `use`
    /// statement of the body. Only statements directly in the type body
    /// count; `use` lines inside methods, closures or anonymous classes do not.
    fn member_insertion_line(&self, declaration: usize) -> usize {
        let body = self.body_start(declaration);
        let mut at = body;
        let mut depth: isize = 1;
        // Set while a trait `use` (possibly `use A { ... }` over several
        // lines) is still open.
        let mut in_trait_use = false;

        for (index, text) in self.lines.iter().enumerate().skip(body) {
            if depth == 1 && patterns::use_clause(text).is_some() {
                in_trait_use = true;
            }
            depth += patterns::brace_delta(text);
            if in_trait_use && depth == 1 {
                at = index + 1;
                in_trait_use = false;
            }
            if depth <= 0 {
                break;
            }
        }

        at.min(self.lines.len())
    }

    fn body_start(&self, declaration: usize) -> usize {
        self.lines[declaration..]
            .iter()
            .position(|line| line.contains('{'))
            .map_or(declaration + 1, |offset| declaration + offset + 1)
            .min(self.lines.len())
    }

    fn member_indent(&self, declaration: usize) -> String {
        let outer = patterns::indentation(&self.lines[declaration]);
        self.lines[self.body_start(declaration)..]
            .iter()
            .find(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('}')
            })
            .map(|line| patterns::indentation(line))
            .filter(|indent| indent.len() > outer.len())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{outer}{MEMBER_INDENT}"))
    }
}

fn render_doc_block(indent: &str, annotations: &[String]) -> Vec<String> {
    let mut block = Vec::with_capacity(annotations.len() + 2);
    block.push(format!("{indent}/**"));
    block.extend(annotations.iter().map(|line| format!("{indent} * {line}")));
    block.push(format!("{indent} */"));
    block
}

/// `     * Some text` -> `     * `; a bare closing line yields its indent + `* `.
fn continuation_prefix(line: &str) -> String {
    let indent = patterns::indentation(line);
    let rest = &line[indent.len()..];
    if rest.starts_with("*/") || !rest.starts_with('*') {
        return format!("{indent}* ");
    }
    let after_star = &rest[1..];
    let gap = after_star.len() - after_star.trim_start().len();
    if gap == 0 {
        format!("{indent}* ")
    } else {
        line[..indent.len() + 1 + gap].to_string()
    }
}

fn is_single_line_statement(line: &str) -> bool {
    let code = line.split("//").next().unwrap_or(line);
    code.trim_end().ends_with(';')
}
