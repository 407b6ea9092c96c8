//! Splitting a single-file component into its top-level blocks.
//!
//! Block contents are opaque at this level except for `<template>`, whose
//! nested `<template>` tags are counted so the right closing tag ends it.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use crate::parser::{Parser, StartTag};
use crate::style;
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::Span;

/// Splits `source` into an [`SfcDocument`], parsing the template block.
pub(crate) fn split(source: &str) -> (SfcDocument, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let mut document = SfcDocument {
        source: source.to_string(),
        ..SfcDocument::default()
    };
    let mut template_errors = Vec::new();

    loop {
        match parser.current_kind() {
            TokenKind::Eof => break,
            TokenKind::CommentOpen => {
                if let TemplateNode::Comment(comment) = parser.parse_comment() {
                    document.comments.push(comment.data);
                }
            }
            TokenKind::LAngle if parser.at_tag_open() => {
                let start_tag = parser.parse_start_tag();
                let extent = block_extent(&mut parser, source, &start_tag);
                add_block(&mut document, &mut parser, &mut template_errors, start_tag, extent);
            }
            TokenKind::LAngleSlash => {
                let tag_name = parser.closing_tag_name().to_string();
                let span = parser.skip_closing_tag();
                parser.error_at(ParseErrorKind::StrayClosingTag { tag_name }, span);
            }
            _ => {
                parser.parse_text();
            }
        }
    }

    if document.script.is_none() && document.script_setup.is_none() {
        document.script_setup = Some(Block {
            name: SmolStr::new_static("scriptSetup"),
            lang: SmolStr::new_static("ts"),
            start: 0,
            end: 0,
            inner_start: 0,
            inner_end: 0,
            attrs: IndexMap::new(),
            content: String::new(),
        });
    }

    let mut errors = parser.into_errors();
    errors.extend(template_errors);
    errors.sort_by_key(|error| error.span.start);
    (document, errors)
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    inner_start: u32,
    inner_end: u32,
    end: u32,
}

/// Finds the content range and end of a block and moves the parser past it.
fn block_extent(parser: &mut Parser<'_>, source: &str, start_tag: &StartTag) -> Extent {
    if start_tag.self_closing || !start_tag.terminated {
        return Extent {
            inner_start: start_tag.start,
            inner_end: start_tag.start,
            end: start_tag.end,
        };
    }

    let content_start = start_tag.end as usize;
    let close = if start_tag.tag == "template" {
        find_template_close(source, content_start)
    } else {
        let needle = format!("</{}", start_tag.tag.to_ascii_lowercase());
        source[content_start..]
            .to_ascii_lowercase()
            .find(&needle)
            .map(|rel| content_start + rel)
    };

    match close {
        Some(close) => {
            parser.sync_to(close as u32);
            let closing = parser.skip_closing_tag();
            Extent {
                inner_start: start_tag.end,
                inner_end: close as u32,
                end: u32::from(closing.end),
            }
        }
        None => {
            parser.error_at(
                ParseErrorKind::UnclosedTag {
                    tag_name: start_tag.tag.to_string(),
                },
                Span::new(start_tag.start, start_tag.end),
            );
            parser.sync_to(source.len() as u32);
            Extent {
                inner_start: start_tag.end,
                inner_end: source.len() as u32,
                end: source.len() as u32,
            }
        }
    }
}

/// Returns the offset of the `</template` closing the block that starts at `from`.
fn find_template_close(source: &str, from: usize) -> Option<usize> {
    let lower = source.to_ascii_lowercase();
    let mut depth = 0usize;
    let mut i = from;
    while let Some(rel) = lower[i..].find("template") {
        let at = i + rel;
        i = at + "template".len();
        let boundary = lower[i..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || c == '>' || c == '/');
        if !boundary {
            continue;
        }
        if lower[..at].ends_with("</") {
            if depth == 0 {
                return Some(at - 2);
            }
            depth -= 1;
        } else if lower[..at].ends_with('<') {
            let tag_end = lower[i..].find('>').map_or(lower.len(), |rel| i + rel);
            if !lower[..tag_end].ends_with('/') {
                depth += 1;
            }
        }
    }
    None
}

fn block_attrs(attributes: Vec<crate::parser::RawAttribute>) -> IndexMap<SmolStr, BlockAttr> {
    attributes
        .into_iter()
        .map(|attr| {
            let value = match attr.value {
                Some(value) => BlockAttr::Value {
                    text: value.content,
                    offset: value.offset,
                    quoted: value.quoted,
                },
                None => BlockAttr::Flag,
            };
            (attr.name, value)
        })
        .collect()
}

fn add_block(
    document: &mut SfcDocument,
    parser: &mut Parser<'_>,
    template_errors: &mut Vec<ParseError>,
    start_tag: StartTag,
    extent: Extent,
) {
    let tag = start_tag.tag.clone();
    let attrs = block_attrs(start_tag.attributes);
    let default_lang = match tag.as_str() {
        "template" => "html",
        "script" => "js",
        "style" => "css",
        _ => "txt",
    };
    let lang = match attrs.get("lang") {
        Some(BlockAttr::Value { text, .. }) => SmolStr::new(text),
        _ => SmolStr::new_static(default_lang),
    };
    let content =
        document.source[extent.inner_start as usize..extent.inner_end as usize].to_string();
    let mut block = Block {
        name: tag.clone(),
        lang,
        start: start_tag.start,
        end: extent.end,
        inner_start: extent.inner_start,
        inner_end: extent.inner_end,
        attrs,
        content,
    };
    let duplicate = |parser: &mut Parser<'_>, name: &str| {
        parser.error_at(
            ParseErrorKind::DuplicateBlock {
                name: name.to_string(),
            },
            Span::new(start_tag.start, start_tag.end),
        );
    };

    match tag.as_str() {
        "template" => {
            if document.template.is_some() {
                duplicate(parser, "template");
            }
            document.template_ast = if block.lang == "html" {
                let (fragment, errors) = Parser::new(&block.content).parse_fragment();
                template_errors.extend(errors.into_iter().map(|error| {
                    ParseError::new(error.kind, error.span.shift(block.inner_start))
                }));
                Some(fragment)
            } else {
                tracing::debug!(lang = %block.lang, "skipping template markup in a foreign language");
                None
            };
            document.template = Some(block);
        }
        "script" => {
            if block.has_attr("setup") || block.has_attr("vapor") {
                if document.script_setup.is_some() {
                    duplicate(parser, "script setup");
                }
                block.name = SmolStr::new_static("scriptSetup");
                document.script_setup = Some(block);
            } else {
                if document.script.is_some() {
                    duplicate(parser, "script");
                }
                document.script = Some(block);
            }
        }
        "style" => {
            block.name = SmolStr::new(format!("style_{}", document.styles.len()));
            let bindings = style::scan_bindings(&block.content);
            let class_names = style::scan_class_names(&block.content);
            document.styles.push(StyleBlock {
                block,
                bindings,
                class_names,
            });
        }
        _ => {
            block.name = SmolStr::new(format!("customBlock_{}", document.custom_blocks.len()));
            document.custom_blocks.push(CustomBlock { block, kind: tag });
        }
    }
}
