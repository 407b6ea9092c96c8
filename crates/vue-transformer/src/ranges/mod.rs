//! Offsets of the script constructs the code generators rewrite.
//!
//! Scripts are parsed with swc. All ranges are byte offsets local to the
//! block content.

mod binding;
mod script;
mod setup;

pub use binding::{collect_binding_identifiers, collect_binding_ranges, BindingIdentifier, BindingRanges};
pub use script::{collect_script_ranges, ExportDefault, ExportOptions, ScriptRanges};
pub use setup::{
    collect_script_setup_ranges, CallRange, DefineModel, DefineOptions, DefineProps, MacroAssignment, ScriptSetupRanges,
    UseTemplateRef,
};

use std::sync::Arc;
use swc_common::comments::{CommentKind, SingleThreadedComments};
use swc_common::{BytePos, FileName, SourceMap, Span as SwcSpan, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// A half-open byte range in block content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The covered text of `content`.
    #[inline]
    pub fn text<'a>(&self, content: &'a str) -> &'a str {
        content.get(self.start as usize..self.end as usize).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A comment in a parsed script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptComment {
    pub block: bool,
    /// Text without the delimiters.
    pub text: String,
    pub range: Range,
}

/// A syntax error reported by swc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub message: String,
    pub range: Range,
}

/// A parsed script block.
#[derive(Debug)]
pub struct ParsedScript {
    /// `None` when the block could not be parsed at all.
    pub module: Option<Module>,
    /// Every comment, ordered by position.
    pub comments: Vec<ScriptComment>,
    pub errors: Vec<ScriptError>,
    start_pos: BytePos,
}

impl ParsedScript {
    /// Converts an swc span to a block-local range.
    #[inline]
    pub fn range(&self, span: SwcSpan) -> Range {
        Range::new(
            span.lo.0.saturating_sub(self.start_pos.0),
            span.hi.0.saturating_sub(self.start_pos.0),
        )
    }

    /// Comments directly before `start`, separated from it and from each
    /// other by whitespace only.
    pub fn leading_comments(&self, content: &str, start: u32) -> &[ScriptComment] {
        let end = self.comments.partition_point(|comment| comment.range.end <= start);
        let mut first = end;
        let mut target = start;
        while first > 0 {
            let comment = &self.comments[first - 1];
            let gap = Range::new(comment.range.end, target).text(content);
            if !gap.chars().all(char::is_whitespace) {
                break;
            }
            first -= 1;
            target = comment.range.start;
        }
        &self.comments[first..end]
    }

    /// The closest block comment among the leading comments of `start`.
    pub fn closest_block_comment(&self, content: &str, start: u32) -> Option<Range> {
        self.leading_comments(content, start)
            .iter()
            .rev()
            .find(|comment| comment.block)
            .map(|comment| comment.range)
    }
}

/// Parses script content in the given `lang` (`ts`, `tsx`, `js`, `jsx`).
///
/// Never fails: syntax errors are collected on the result.
pub fn parse_script(content: &str, lang: &str) -> ParsedScript {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(format!("script.{lang}")).into(), content.to_string());
    let start_pos = fm.start_pos;
    let syntax = match lang {
        "ts" | "tsx" | "mts" | "cts" => Syntax::Typescript(TsSyntax {
            tsx: lang == "tsx",
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: lang == "jsx",
            decorators: true,
            ..Default::default()
        }),
    };

    let comments = SingleThreadedComments::default();
    let mut parser = Parser::new(syntax, StringInput::from(&*fm), Some(&comments));
    let result = parser.parse_module();
    let mut parsed = ParsedScript {
        module: None,
        comments: Vec::new(),
        errors: Vec::new(),
        start_pos,
    };

    let mut errors = parser.take_errors();
    match result {
        Ok(module) => parsed.module = Some(module),
        Err(error) => errors.push(error),
    }
    parsed.errors = errors
        .into_iter()
        .map(|error| ScriptError {
            range: parsed.range(error.span()),
            message: error.kind().msg().to_string(),
        })
        .collect();

    let (leading, trailing) = comments.take_all();
    let mut all: Vec<ScriptComment> = Vec::new();
    for map in [leading, trailing] {
        for comment in map.borrow().values().flatten() {
            all.push(ScriptComment {
                block: comment.kind == CommentKind::Block,
                text: comment.text.to_string(),
                range: parsed.range(comment.span),
            });
        }
    }
    all.sort_by_key(|comment| comment.range.start);
    all.dedup_by_key(|comment| comment.range.start);
    parsed.comments = all;

    tracing::trace!(
        lang,
        errors = parsed.errors.len(),
        comments = parsed.comments.len(),
        "parsed script block"
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_collects_comments_in_order() {
        let content = "// a\n/* b */\nconst x = 1; // c\n";
        let parsed = parse_script(content, "ts");
        assert!(parsed.module.is_some());
        let texts: Vec<_> = parsed.comments.iter().map(|c| c.text.trim().to_string()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(parsed.comments[1].range, Range::new(5, 12));
    }

    #[test]
    fn test_leading_comments_stop_at_code() {
        let content = "/* a */ foo();\n// b\n/* c */\nbar();";
        let parsed = parse_script(content, "js");
        let start = content.find("bar").unwrap() as u32;
        let leading = parsed.leading_comments(content, start);
        assert_eq!(leading.len(), 2);
        assert_eq!(parsed.closest_block_comment(content, start), Some(Range::new(20, 27)));
    }

    #[test]
    fn test_syntax_errors_are_collected() {
        let parsed = parse_script("const = ;", "ts");
        assert!(!parsed.errors.is_empty());
    }
}
