//! Indentation and block structure
//!
//! Turns the flat list of line records into an ownership tree, enforces the
//! block grammar, and folds `+` continuation lines into the logical line they
//! extend.

use tracing::{debug, span, trace, Level};

use super::source::{LineRecord, LineRole, Symbol};
use crate::core::DiagramError;

/// A declaration or subclass line with its continuations folded in
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine<'src> {
    /// Index of the record this line starts at
    pub head: usize,
    /// Source line of each `\n`-separated segment of `content`
    pub numbers: Vec<usize>,
    pub content: String,
    pub symbol: Option<Symbol<'src>>,
    pub role: LineRole,
    /// Index of the owning head record, `None` at top level
    pub owner: Option<usize>,
}

impl LogicalLine<'_> {
    /// Source line the logical line starts on
    pub fn number(&self) -> usize {
        self.numbers.first().copied().unwrap_or_default()
    }
}

/// Maps `\n`-separated segments of a logical line back to source lines
#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentLines<'a> {
    numbers: &'a [usize],
}

impl<'a> SegmentLines<'a> {
    pub fn new(numbers: &'a [usize]) -> Self {
        Self { numbers }
    }

    /// Source line of `segment`, clamped to the last segment
    pub fn line(&self, segment: usize) -> usize {
        self.numbers
            .get(segment)
            .or_else(|| self.numbers.last())
            .copied()
            .unwrap_or_default()
    }
}

/// Assign each record its owner: the nearest earlier line with a strictly
/// smaller indentation width.
///
/// All children of one owner must share one width. The first line must not
/// be indented.
pub(crate) fn resolve_indentation(records: &mut [LineRecord<'_>]) -> Result<(), DiagramError> {
    let span = span!(Level::DEBUG, "resolve_indentation", lines = records.len());
    let _enter = span.enter();

    if let Some(first) = records.first() {
        if first.indent > 0 {
            return Err(DiagramError::parse_error(
                format!(
                    "First line of script (line {}) cannot have whitespace",
                    first.number
                ),
                first.number,
            ));
        }
    }

    // (width, record index)
    let mut stack: Vec<(usize, usize)> = Vec::new();
    // Per owner: expected child width and the child that set it
    let mut child_width: Vec<Option<(usize, usize)>> = vec![None; records.len()];

    for index in 0..records.len() {
        let width = records[index].indent;
        while stack.last().is_some_and(|&(top, _)| top >= width) {
            stack.pop();
        }
        let owner = stack.last().map(|&(_, line)| line);
        stack.push((width, index));
        records[index].owner = owner;

        let Some(owner) = owner else {
            continue;
        };
        let current = child_width[owner];
        match current {
            None => child_width[owner] = Some((width, index)),
            Some((expected, _)) if expected == width => {}
            Some((_, setter)) => {
                let record = &records[index];
                return Err(DiagramError::parse_error(
                    format!(
                        "Children of {} have inconsistent indentation: {} has different indentation than line {}",
                        records[owner].subject(),
                        record.subject_capitalized(),
                        records[setter].number
                    ),
                    record.number,
                ));
            }
        }
        trace!(line = records[index].number, width, owner, "Resolved owner");
    }

    debug!(
        top_level = records.iter().filter(|r| r.owner.is_none()).count(),
        "Resolved indentation"
    );
    Ok(())
}

/// Enforce the block grammar over the line roles.
///
/// A continuation must extend a declaration, subclass-definition or
/// continuation line owned by the same parent. Subclass lines must be owned.
/// A subclass-definition line must be the last line of its block.
pub(crate) fn classify_roles(records: &[LineRecord<'_>]) -> Result<(), DiagramError> {
    let span = span!(Level::DEBUG, "classify_roles", lines = records.len());
    let _enter = span.enter();

    let not_last = |at: usize| {
        let line = records[at].number;
        DiagramError::parse_error(
            format!("Line {}: non-prefixed lines must be last line in block", line),
            line,
        )
    };
    let invalid = |record: &LineRecord<'_>, what: &str| {
        DiagramError::parse_error(format!("Line {}: {}", record.number, what), record.number)
    };

    let mut definition_at: Option<usize> = None;
    for (index, record) in records.iter().enumerate() {
        match record.role {
            LineRole::Symbol => {
                if let Some(at) = definition_at {
                    return Err(not_last(at));
                }
                continue;
            }
            LineRole::Continuation => {
                if record.content.chars().nth(1) != Some(' ') {
                    return Err(invalid(record, "'+' lines must have a space after '+'"));
                }
                let Some(previous) = index.checked_sub(1).map(|i| &records[i]) else {
                    return Err(invalid(record, "'+' line cannot be the first line"));
                };
                if previous.owner != record.owner {
                    return Err(invalid(
                        record,
                        "'+' lines must have same whitespace as previous line",
                    ));
                }
                if previous.role == LineRole::SubclassReference {
                    return Err(invalid(
                        record,
                        "'+' lines must be preceded by a symbol definition",
                    ));
                }
            }
            LineRole::SubclassReference => {
                if let Some(at) = definition_at {
                    return Err(not_last(at));
                }
                if record.owner.is_none() {
                    return Err(invalid(
                        record,
                        "subclass reference lines must be owned by an entity",
                    ));
                }
            }
            LineRole::SubclassDefinition => {
                if let Some(at) = definition_at {
                    return Err(not_last(at));
                }
                if record.owner.is_none() {
                    return Err(invalid(
                        record,
                        "non-prefixed lines must be owned by an entity",
                    ));
                }
                definition_at = Some(index);
            }
        }

        // A following line that climbs out of this block ends it
        if records
            .get(index + 1)
            .is_some_and(|next| next.owner < record.owner)
        {
            definition_at = None;
        }
    }

    Ok(())
}

/// Fold continuation lines into their head line and point every owner at a
/// head line.
pub(crate) fn merge_continuations<'src>(records: &mut [LineRecord<'src>]) -> Vec<LogicalLine<'src>> {
    let span = span!(Level::DEBUG, "merge_continuations", lines = records.len());
    let _enter = span.enter();

    let mut head_of: Vec<usize> = Vec::with_capacity(records.len());
    let mut logical: Vec<LogicalLine<'src>> = Vec::new();

    for index in 0..records.len() {
        if let Some(owner) = records[index].owner {
            records[index].owner = Some(head_of[owner]);
        }
        let record = &records[index];

        match (record.role, logical.last_mut()) {
            (LineRole::Continuation, Some(head)) => {
                head.content.push('\n');
                head.content.push_str(&record.content[1..]);
                head.numbers.push(record.number);
                head_of.push(head.head);
                trace!(line = record.number, into = head.number(), "Merged continuation");
            }
            _ => {
                logical.push(LogicalLine {
                    head: index,
                    numbers: vec![record.number],
                    content: record.content.to_string(),
                    symbol: record.symbol,
                    role: record.role,
                    owner: record.owner,
                });
                head_of.push(index);
            }
        }
    }

    debug!(
        physical = records.len(),
        logical = logical.len(),
        "Merged continuation lines"
    );
    logical
}

/// Only entity declarations may own other lines.
pub(crate) fn validate_ownership(records: &[LineRecord<'_>]) -> Result<(), DiagramError> {
    for record in records {
        let Some(owner) = record.owner.map(|i| &records[i]) else {
            continue;
        };
        if !owner.is_entity() {
            return Err(DiagramError::parse_error(
                format!(
                    "{} cannot be owned by {}",
                    record.subject_capitalized(),
                    owner.subject()
                ),
                record.number,
            ));
        }
    }
    Ok(())
}
