//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred during parsing.
///
/// Errors never stop the parser; they are collected next to the partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// An unexpected token was encountered.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },

    /// An unexpected end of file was encountered.
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof {
        /// What was expected.
        expected: String,
    },

    /// An element or block was never closed.
    #[error("unclosed tag: <{tag_name}>")]
    UnclosedTag {
        /// The name of the unclosed tag.
        tag_name: String,
    },

    /// A top-level block that may appear only once was repeated.
    #[error("duplicate <{name}> block")]
    DuplicateBlock {
        /// The block name.
        name: String,
    },

    /// A closing tag with no open element.
    #[error("stray closing tag: </{tag_name}>")]
    StrayClosingTag {
        /// The tag name found.
        tag_name: String,
    },

    /// An interpolation or comment was never terminated.
    #[error("unterminated {construct}")]
    Unterminated {
        /// The construct, e.g. `interpolation`.
        construct: &'static str,
    },

    /// An invalid directive was found.
    #[error("invalid directive: {message}")]
    InvalidDirective {
        /// A description of the problem.
        message: String,
    },

    /// `v-else` or `v-else-if` without a preceding `v-if`.
    #[error("v-{directive} has no adjacent v-if or v-else-if")]
    MissingIf {
        /// `else` or `else-if`.
        directive: &'static str,
    },

    /// A `v-for` expression without `in` or `of`.
    #[error("invalid v-for expression: {expression}")]
    InvalidFor {
        /// The raw expression.
        expression: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ParseError::new(
            ParseErrorKind::UnclosedTag {
                tag_name: "div".to_string(),
            },
            Span::new(0u32, 5u32),
        );
        assert_eq!(error.to_string(), "unclosed tag: <div>");
        assert_eq!(
            ParseErrorKind::MissingIf { directive: "else" }.to_string(),
            "v-else has no adjacent v-if or v-else-if"
        );
    }
}
