//! Structural pass: folds `v-if` chains and `v-for` loops into dedicated nodes.
//!
//! Whitespace-only text is dropped. A `<template>` carrying `v-slot` is left
//! untouched; its conditions belong to the slot.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use std::collections::VecDeque;

/// Folds a node list, recursing into children.
pub(crate) fn fold(nodes: Vec<TemplateNode>, errors: &mut Vec<ParseError>) -> Vec<TemplateNode> {
    let mut queue: VecDeque<TemplateNode> = nodes.into();
    let mut out = Vec::with_capacity(queue.len());

    while let Some(node) = queue.pop_front() {
        let mut el = match node {
            TemplateNode::Text(text) if text.data.trim().is_empty() => continue,
            TemplateNode::Element(el) => el,
            other => {
                out.push(other);
                continue;
            }
        };
        el.children = fold(std::mem::take(&mut el.children), errors);
        if is_slot_template(&el) {
            out.push(TemplateNode::Element(el));
            continue;
        }

        if let Some(dir) = take_directive(&mut el, "if") {
            let mut span = el.span;
            let mut branches = vec![branch(el, dir.exp, errors)];
            let mut pending = Vec::new();
            while let Some(next) = queue.front() {
                match next {
                    TemplateNode::Text(text) if text.data.trim().is_empty() => {
                        queue.pop_front();
                    }
                    TemplateNode::Comment(_) => {
                        pending.extend(queue.pop_front());
                    }
                    TemplateNode::Element(next_el)
                        if !is_slot_template(next_el)
                            && (next_el.directive("else-if").is_some()
                                || next_el.directive("else").is_some()) =>
                    {
                        let Some(TemplateNode::Element(mut next_el)) = queue.pop_front() else {
                            break;
                        };
                        next_el.children = fold(std::mem::take(&mut next_el.children), errors);
                        let condition = match take_directive(&mut next_el, "else-if") {
                            Some(dir) => dir.exp,
                            None => {
                                take_directive(&mut next_el, "else");
                                None
                            }
                        };
                        span = span.cover(next_el.span);
                        branches.push(branch(next_el, condition, errors));
                        // Comments between branches are dropped.
                        pending.clear();
                    }
                    _ => break,
                }
            }
            out.push(TemplateNode::If(IfNode { span, branches }));
            for comment in pending.into_iter().rev() {
                queue.push_front(comment);
            }
            continue;
        }

        for directive in ["else-if", "else"] {
            if let Some(dir) = take_directive(&mut el, directive) {
                errors.push(ParseError::new(
                    ParseErrorKind::MissingIf { directive },
                    dir.span,
                ));
            }
        }
        out.push(wrap_for(el, errors));
    }

    out
}

fn is_slot_template(el: &Element) -> bool {
    el.tag_type == TagType::Template && el.directive("slot").is_some()
}

fn take_directive(el: &mut Element, name: &str) -> Option<Directive> {
    let index = el
        .props
        .iter()
        .position(|prop| matches!(prop, Prop::Directive(dir) if dir.name == name))?;
    match el.props.remove(index) {
        Prop::Directive(dir) => Some(dir),
        Prop::Attribute(_) => None,
    }
}

fn branch(mut el: Element, condition: Option<ExpressionNode>, errors: &mut Vec<ParseError>) -> IfBranch {
    let span = el.span;
    let unwrap = el.tag_type == TagType::Template && el.directive("for").is_none();
    let children = if unwrap {
        std::mem::take(&mut el.children)
    } else {
        vec![wrap_for(el, errors)]
    };
    IfBranch {
        span,
        condition,
        children,
    }
}

fn wrap_for(mut el: Element, errors: &mut Vec<ParseError>) -> TemplateNode {
    let Some(dir) = take_directive(&mut el, "for") else {
        return TemplateNode::Element(el);
    };
    let span = el.span;
    let parsed = dir.exp.as_ref().and_then(parse_for_expression);
    if parsed.is_none() {
        errors.push(ParseError::new(
            ParseErrorKind::InvalidFor {
                expression: dir.exp.map(|exp| exp.content).unwrap_or_default(),
            },
            dir.span,
        ));
    }
    let parsed = parsed.unwrap_or_default();
    let children = if el.tag_type == TagType::Template {
        el.children
    } else {
        vec![TemplateNode::Element(el)]
    };
    TemplateNode::For(ForNode {
        span,
        source: parsed.source,
        value: parsed.value,
        key: parsed.key,
        index: parsed.index,
        children,
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ForParts {
    source: Option<ExpressionNode>,
    value: Option<ExpressionNode>,
    key: Option<ExpressionNode>,
    index: Option<ExpressionNode>,
}

/// Splits `lhs in|of rhs` at the first whitespace-delimited `in` or `of`
/// that is followed by a non-empty right-hand side.
fn split_alias(exp: &str) -> Option<(usize, usize)> {
    let bytes = exp.as_bytes();
    for (lhs_end, c) in exp.char_indices() {
        if !c.is_whitespace() {
            continue;
        }
        let after_ws = lhs_end + exp[lhs_end..].len() - exp[lhs_end..].trim_start().len();
        let keyword = &exp[after_ws..];
        if !(keyword.starts_with("in") || keyword.starts_with("of")) {
            continue;
        }
        let after_keyword = after_ws + 2;
        if !bytes.get(after_keyword).is_some_and(|b| b.is_ascii_whitespace()) {
            continue;
        }
        let rhs_start = after_keyword + exp[after_keyword..].len() - exp[after_keyword..].trim_start().len();
        if rhs_start < exp.len() {
            return Some((lhs_end, rhs_start));
        }
    }
    None
}

/// Finds the trailing `, key` or `, key, index` part of an alias list.
///
/// Returns the start of the match and the raw group texts with their offsets.
fn split_iterator(value: &str) -> Option<(usize, (usize, &str), Option<(usize, &str)>)> {
    let last = value.rfind(',')?;
    let after_last = &value[last + 1..];
    if after_last.contains(['}', ']']) {
        return None;
    }
    if let Some(prev) = value[..last].rfind(',') {
        let between = &value[prev + 1..last];
        if !between.contains(['}', ']']) {
            return Some((prev, (prev + 1, between), Some((last + 1, after_last))));
        }
    }
    Some((last, (last + 1, after_last), None))
}

fn trimmed(text: &str, offset: usize) -> (usize, &str) {
    let start = text.len() - text.trim_start().len();
    (offset + start, text.trim())
}

fn parse_for_expression(input: &ExpressionNode) -> Option<ForParts> {
    let exp = input.content.as_str();
    let base = input.offset as usize;
    let node = |content: &str, offset: usize| ExpressionNode::new(content, (base + offset) as u32, false);

    let (lhs_end, rhs_start) = split_alias(exp)?;
    let rhs = exp[rhs_start..].trim_end();
    let mut parts = ForParts {
        source: Some(node(rhs, rhs_start)),
        ..ForParts::default()
    };

    let (mut value_offset, mut value) = trimmed(&exp[..lhs_end], 0);
    if let Some(stripped) = value.strip_prefix('(') {
        value = stripped;
        value_offset += 1;
    }
    value = value.strip_suffix(')').unwrap_or(value);
    (value_offset, value) = trimmed(value, value_offset);

    if let Some((match_start, (key_at, key_raw), index)) = split_iterator(value) {
        let (key_offset, key) = trimmed(key_raw, value_offset + key_at);
        if !key.is_empty() {
            parts.key = Some(node(key, key_offset));
        }
        if let Some((index_at, index_raw)) = index {
            let (index_offset, index) = trimmed(index_raw, value_offset + index_at);
            if !index.is_empty() {
                parts.index = Some(node(index, index_offset));
            }
        }
        value = value[..match_start].trim_end();
    }
    if !value.is_empty() {
        parts.value = Some(node(value, value_offset));
    }
    Some(parts)
}
