//! Line normalization and symbol classification
//!
//! The first two passes over the source. Blank lines are dropped, every
//! remaining line becomes a [`LineRecord`] that remembers its 1-based source
//! line, and a `Name:` or `<Name>:` prefix registers the line as an entity or
//! relationship declaration.

use std::collections::HashMap;

use tracing::{debug, span, trace, Level};

use crate::core::chumsky_utils::is_identifier;
use crate::core::DiagramError;

/// Columns a tab counts for when measuring indentation
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolKind {
    Entity,
    Relationship,
}

impl SymbolKind {
    fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Entity => "entity",
            SymbolKind::Relationship => "relationship",
        }
    }
}

/// A declared entity or relationship name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Symbol<'src> {
    pub name: &'src str,
    pub kind: SymbolKind,
}

/// What a line contributes to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineRole {
    /// `Name: ...` or `<Name>: ...`
    Symbol,
    /// `+ ...`, folded into the line before it
    Continuation,
    /// Free text naming subclasses of the owning entity
    SubclassDefinition,
    /// `[Name]`, pulls an entity into the owning block's candidate pool
    SubclassReference,
}

impl LineRole {
    fn detect(has_symbol: bool, trimmed: &str) -> Self {
        if has_symbol {
            LineRole::Symbol
        } else if trimmed.starts_with('+') {
            LineRole::Continuation
        } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
            LineRole::SubclassReference
        } else {
            LineRole::SubclassDefinition
        }
    }
}

/// Everything the pipeline derives about one non-blank source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineRecord<'src> {
    /// 1-based line number in the original source
    pub number: usize,
    /// Indentation width (tabs count as four columns)
    pub indent: usize,
    pub symbol: Option<Symbol<'src>>,
    /// Trimmed text after the symbol prefix, or the whole trimmed line
    pub content: &'src str,
    pub role: LineRole,
    /// Index of the owning record, `None` at top level
    pub owner: Option<usize>,
}

impl<'src> LineRecord<'src> {
    /// `entity 'X' (line N)` for declarations, `line N` otherwise
    pub fn subject(&self) -> String {
        match self.symbol {
            Some(symbol) => format!(
                "{} '{}' (line {})",
                symbol.kind.as_str(),
                symbol.name,
                self.number
            ),
            None => format!("line {}", self.number),
        }
    }

    /// [`subject`](Self::subject) with a capital first letter
    pub fn subject_capitalized(&self) -> String {
        capitalize(&self.subject())
    }

    pub fn is_entity(&self) -> bool {
        matches!(
            self.symbol,
            Some(Symbol {
                kind: SymbolKind::Entity,
                ..
            })
        )
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Drop blank lines, keeping each survivor's 1-based source line number.
pub(crate) fn normalize_lines(input: &str) -> Vec<(usize, &str)> {
    let span = span!(Level::DEBUG, "normalize_lines");
    let _enter = span.enter();

    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
        .collect();

    debug!(kept = lines.len(), "Normalized source lines");
    lines
}

/// Split each line on its declaration delimiter and build the line records.
///
/// Symbol names are validated and checked for redefinition once every line
/// has been split, so a malformed prefix further down is reported before a
/// bad name further up.
pub(crate) fn classify_symbols<'src>(
    lines: &[(usize, &'src str)],
) -> Result<Vec<LineRecord<'src>>, DiagramError> {
    let span = span!(Level::DEBUG, "classify_symbols", lines = lines.len());
    let _enter = span.enter();

    let mut records = Vec::with_capacity(lines.len());
    for &(number, text) in lines {
        let record = split_symbol(number, text)?;
        trace!(line = number, symbol = ?record.symbol, role = ?record.role, "Classified line");
        records.push(record);
    }

    validate_names(&records)?;
    validate_definitions(&records)?;

    debug!(
        symbols = records.iter().filter(|r| r.symbol.is_some()).count(),
        "Classified symbols"
    );
    Ok(records)
}

fn split_symbol(number: usize, text: &str) -> Result<LineRecord<'_>, DiagramError> {
    let mut parts = text.split(':');
    let head = parts.next().unwrap_or_default();
    let rest = parts.next();
    if parts.next().is_some() {
        return Err(DiagramError::parse_error(
            format!("Too many ':' in line {}", number),
            number,
        ));
    }

    let indent = indent_width(text);
    let Some(rest) = rest else {
        let content = text.trim();
        return Ok(LineRecord {
            number,
            indent,
            symbol: None,
            content,
            role: LineRole::detect(false, content),
            owner: None,
        });
    };

    let head = head.trim();
    let symbol = match head.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        Some(inner) => Symbol {
            name: inner.trim(),
            kind: SymbolKind::Relationship,
        },
        None => Symbol {
            name: head,
            kind: SymbolKind::Entity,
        },
    };
    if symbol.name.is_empty() {
        return Err(DiagramError::parse_error(
            format!("Symbol cannot be empty on line {}", number),
            number,
        ));
    }

    Ok(LineRecord {
        number,
        indent,
        symbol: Some(symbol),
        content: rest.trim(),
        role: LineRole::Symbol,
        owner: None,
    })
}

fn validate_names(records: &[LineRecord<'_>]) -> Result<(), DiagramError> {
    for record in records {
        if let Some(symbol) = record.symbol {
            if !is_identifier(symbol.name) {
                return Err(DiagramError::parse_error(
                    format!(
                        "{} is not valid, should only contain alphanumeric characters, underscores and dashes",
                        record.subject_capitalized()
                    ),
                    record.number,
                ));
            }
        }
    }
    Ok(())
}

fn validate_definitions(records: &[LineRecord<'_>]) -> Result<(), DiagramError> {
    let mut seen: HashMap<&str, &LineRecord<'_>> = HashMap::new();
    for record in records {
        let Some(symbol) = record.symbol else {
            continue;
        };
        if let Some(first) = seen.get(symbol.name) {
            return Err(DiagramError::parse_error(
                format!(
                    "{} is redefined: conflicts with {}",
                    record.subject_capitalized(),
                    first.subject()
                ),
                record.number,
            ));
        }
        seen.insert(symbol.name, record);
    }
    Ok(())
}
