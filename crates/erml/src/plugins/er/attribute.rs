//! Entity attribute lists
//!
//! An attribute list is a run of space-separated tokens. Each token is a name
//! with optional markers, `[key]`, `<computed>` and `list[]`, and may carry a
//! brace-delimited component list that makes it composite:
//!
//! ```text
//! [ssn] name{first last} <age> phones[] address{street city{name zip}}
//! ```
//!
//! Names are unique across the whole tree of one declaration, components
//! included.

use std::collections::HashSet;

use crate::core::chumsky_utils::is_identifier;
use crate::core::DiagramError;

use super::database::Attribute;
use super::structure::SegmentLines;

/// Name and marker flags of one stripped token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Markers<'a> {
    pub name: &'a str,
    pub is_key: bool,
    pub is_computed: bool,
    pub is_list: bool,
}

/// Strip markers in a fixed order: `[..]` (key), then `<..>` (computed),
/// then a `[]` suffix (list).
pub(crate) fn strip_markers(token: &str) -> Markers<'_> {
    let mut name = token;
    let mut markers = Markers {
        name,
        is_key: false,
        is_computed: false,
        is_list: false,
    };
    if let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        name = inner.trim();
        markers.is_key = true;
    }
    if let Some(inner) = name.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        name = inner.trim();
        markers.is_computed = true;
    }
    if let Some(inner) = name.strip_suffix("[]") {
        name = inner.trim();
        markers.is_list = true;
    }
    markers.name = name;
    markers
}

/// Parse the attribute list of an entity declaration.
///
/// `content` may span several source lines joined with `\n`; `lines` maps
/// each segment back to its source line for diagnostics.
pub(crate) fn parse_attributes(
    content: &str,
    lines: SegmentLines<'_>,
) -> Result<Vec<Attribute>, DiagramError> {
    let mut parser = AttributeParser {
        chars: content.chars().collect(),
        lines,
        segment: 0,
        names: HashSet::new(),
    };
    let end = parser.chars.len();
    parser.parse_range(0, end)
}

struct AttributeParser<'a> {
    chars: Vec<char>,
    lines: SegmentLines<'a>,
    /// Current `\n`-separated segment
    segment: usize,
    /// Every name seen so far in this declaration
    names: HashSet<String>,
}

impl AttributeParser<'_> {
    fn line(&self) -> usize {
        self.lines.line(self.segment)
    }

    fn error(&self, message: String) -> DiagramError {
        DiagramError::parse_error(message, self.line())
    }

    fn parse_range(&mut self, start: usize, end: usize) -> Result<Vec<Attribute>, DiagramError> {
        let mut attributes = Vec::new();
        let mut token = String::new();
        let mut components: Option<Vec<Attribute>> = None;

        let mut index = start;
        while index < end {
            match self.chars[index] {
                '{' => {
                    if components.is_some() {
                        return Err(self.error(format!(
                            "Multiple '{{}}' definitions for attribute '{}' (line {})",
                            token,
                            self.line()
                        )));
                    }
                    let close = self
                        .matching_brace(index + 1, end)
                        .ok_or_else(|| self.error(format!("Unmatched brace at line {}", self.line())))?;
                    let children = self.parse_range(index + 1, close)?;
                    if children.is_empty() {
                        return Err(self.error(format!(
                            "Composite attribute '{}' (line {}) cannot be empty",
                            token,
                            self.line()
                        )));
                    }
                    components = Some(children);
                    index = close;
                }
                separator @ (' ' | '\n') => {
                    self.finish(&mut token, &mut components, &mut attributes)?;
                    if separator == '\n' {
                        self.segment += 1;
                    }
                }
                c => {
                    if components.is_some() {
                        return Err(self.error(format!(
                            "No characters are allowed after a '{{}}' block at line {}",
                            self.line()
                        )));
                    }
                    token.push(c);
                }
            }
            index += 1;
        }
        self.finish(&mut token, &mut components, &mut attributes)?;
        Ok(attributes)
    }

    /// Index of the `}` closing a brace opened just before `start`
    fn matching_brace(&self, start: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for index in start..end {
            match self.chars[index] {
                '{' => depth += 1,
                '}' if depth == 0 => return Some(index),
                '}' => depth -= 1,
                _ => {}
            }
        }
        None
    }

    /// Turn the accumulated token into an attribute
    fn finish(
        &mut self,
        token: &mut String,
        components: &mut Option<Vec<Attribute>>,
        attributes: &mut Vec<Attribute>,
    ) -> Result<(), DiagramError> {
        let components = components.take();
        if token.is_empty() {
            if components.is_some() {
                return Err(self.error(format!(
                    "Composite attribute name cannot be empty at line {}",
                    self.line()
                )));
            }
            return Ok(());
        }

        let raw = std::mem::take(token);
        let markers = strip_markers(&raw);
        let line = self.line();
        if markers.name.is_empty() {
            return Err(self.error(format!("Attribute name cannot be empty at line {}", line)));
        }
        if !is_identifier(markers.name) {
            return Err(self.error(format!(
                "Attribute '{}' (line {}) is not valid, should only contain alphanumeric characters, underscores and dashes",
                markers.name, line
            )));
        }
        if markers.is_list && components.is_some() {
            return Err(self.error(format!(
                "Composite attribute '{}' (line {}) cannot be a list",
                markers.name, line
            )));
        }
        if !self.names.insert(markers.name.to_string()) {
            return Err(self.error(format!(
                "Attribute '{}' (line {}) is redefined",
                markers.name, line
            )));
        }

        let attribute = match components {
            Some(children) => Attribute::composite(markers.name, children),
            None => Attribute::simple(markers.name),
        };
        attributes.push(
            attribute
                .with_key(markers.is_key)
                .with_computed(markers.is_computed)
                .with_list(markers.is_list),
        );
        Ok(())
    }
}
