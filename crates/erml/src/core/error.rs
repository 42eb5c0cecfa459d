//! Core error types for diagram processing
//!
//! Every violation found while compiling a model is reported as a single
//! [`DiagramError`]. Compilation stops at the first one.

use thiserror::Error;

/// Core error types for diagram processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagramError {
    /// A problem with the input text. `line` is the 1-based source line.
    #[error("Parse error: {message}")]
    ParseError { message: String, line: usize },

    /// A state the earlier passes should have ruled out; a compiler defect,
    /// not an input problem.
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl DiagramError {
    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>, line: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            line,
        }
    }

    /// Create a new internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Source line the error points at, if it is an input error
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::ParseError { line, .. } => Some(*line),
            Self::InternalError { .. } => None,
        }
    }

    /// Returns true if this error signals a compiler defect
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let error = DiagramError::parse_error("Line 5: entity 'X' does not exist", 5);
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Parse error"));
        assert!(error_msg.contains("entity 'X' does not exist"));
        assert!(error_msg.contains("Line 5"));
        assert_eq!(error.line(), Some(5));
        assert!(!error.is_internal());
    }

    #[test]
    fn test_internal_error() {
        let error = DiagramError::internal_error("subclass stack is empty");
        let error_msg = format!("{}", error);
        assert!(error_msg.starts_with("Internal error"));
        assert!(error_msg.contains("subclass stack is empty"));
        assert_eq!(error.line(), None);
        assert!(error.is_internal());
    }

    #[test]
    fn test_anyhow_roundtrip() {
        let error: anyhow::Error = DiagramError::parse_error("bad", 2).into();
        let inner = error.downcast_ref::<DiagramError>().unwrap();
        assert_eq!(inner.line(), Some(2));
    }
}
