//! Vue single-file component parser for vue-check-rs.
//!
//! This crate provides:
//! - A block splitter for `.vue` files ([`parse`])
//! - A template parser with `v-if`/`v-for` folding ([`parse_template`])
//! - Style block scanning for `v-bind()` references and class selectors
//!
//! Parsing is fail-soft: malformed input yields a partial result and a list
//! of [`ParseError`]s, never a panic.
//!
//! # Example
//!
//! ```
//! use vue_parser::{parse, TemplateNode};
//!
//! let source = r#"
//! <script setup lang="ts">
//! const count = ref(0);
//! </script>
//!
//! <template>
//!   <button @click="count++">{{ count }}</button>
//! </template>
//! "#;
//!
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//! assert_eq!(result.document.script_setup.unwrap().lang, "ts");
//! let template = result.document.template_ast.unwrap();
//! assert!(matches!(template.nodes[0], TemplateNode::Element(_)));
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
mod sfc;
mod structure;
mod style;
mod tags;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use source_map::Span;
pub use style::{scan_bindings, scan_class_names};

/// The result of parsing a `.vue` file.
#[derive(Debug)]
pub struct ParseResult {
    /// The split document.
    pub document: SfcDocument,
    /// Any errors encountered, in document coordinates.
    pub errors: Vec<ParseError>,
}

/// The result of parsing template markup on its own.
#[derive(Debug)]
pub struct TemplateParseResult {
    pub fragment: Fragment,
    /// Any errors encountered, in coordinates local to the parsed content.
    pub errors: Vec<ParseError>,
}

/// Parses a `.vue` source file into its blocks.
///
/// The template block, when written in HTML, is parsed as well and exposed
/// as [`SfcDocument::template_ast`].
pub fn parse(source: &str) -> ParseResult {
    let (document, errors) = sfc::split(source);
    tracing::trace!(
        styles = document.styles.len(),
        custom_blocks = document.custom_blocks.len(),
        errors = errors.len(),
        "split single-file component"
    );
    ParseResult { document, errors }
}

/// Parses template markup. Offsets in the result are relative to `content`.
pub fn parse_template(content: &str) -> TemplateParseResult {
    let (fragment, errors) = parser::Parser::new(content).parse_fragment();
    TemplateParseResult { fragment, errors }
}
