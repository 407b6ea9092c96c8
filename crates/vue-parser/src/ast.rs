//! AST types for Vue single-file components.
//!
//! Document-level types ([`SfcDocument`], [`Block`]) use document-absolute
//! offsets. Template nodes use offsets local to the template block content.

use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::Span;

/// A split single-file component.
#[derive(Debug, Clone, Default)]
pub struct SfcDocument {
    /// The original source text.
    pub source: String,
    /// The `<template>` block.
    pub template: Option<Block>,
    /// The parsed template content, present when `template` is.
    pub template_ast: Option<Fragment>,
    /// The plain `<script>` block.
    pub script: Option<Block>,
    /// The `<script setup>` block.
    pub script_setup: Option<Block>,
    /// All `<style>` blocks in order.
    pub styles: Vec<StyleBlock>,
    /// Every other top-level block in order.
    pub custom_blocks: Vec<CustomBlock>,
    /// Contents of top-level `<!-- ... -->` comments.
    pub comments: Vec<String>,
}

/// A top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Block {
    /// `template`, `script`, `scriptSetup`, `style_<n>` or `customBlock_<n>`.
    pub name: SmolStr,
    /// The `lang` attribute or the block's default language.
    pub lang: SmolStr,
    /// Offset of the opening `<`.
    pub start: u32,
    /// Offset past the closing tag.
    pub end: u32,
    /// Offset of the first content byte.
    pub inner_start: u32,
    /// Offset past the last content byte.
    pub inner_end: u32,
    /// Attributes of the opening tag, in source order.
    pub attrs: IndexMap<SmolStr, BlockAttr>,
    /// The content between the tags.
    pub content: String,
}

impl Block {
    /// Returns the attribute value text, if the attribute has one.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name)? {
            BlockAttr::Value { text, .. } => Some(text),
            BlockAttr::Flag => None,
        }
    }

    /// Returns true if the attribute is present, with or without a value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// The content span in document coordinates.
    pub fn inner_span(&self) -> Span {
        Span::new(self.inner_start, self.inner_end)
    }
}

/// A block attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BlockAttr {
    /// Present without a value, e.g. `setup`.
    Flag,
    /// `name="text"`.
    Value {
        text: String,
        /// Document offset of the first byte of `text`.
        offset: u32,
        quoted: bool,
    },
}

/// A `<style>` block with the references scanned from its content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleBlock {
    pub block: Block,
    /// `v-bind(...)` expressions.
    pub bindings: Vec<StyleRef>,
    /// `.class` selectors, including the leading dot.
    pub class_names: Vec<StyleRef>,
}

/// Text found in a style block, with its block-local offset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleRef {
    pub text: String,
    pub offset: u32,
}

/// Any other top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CustomBlock {
    pub block: Block,
    /// The tag name.
    pub kind: SmolStr,
}

/// A list of template nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// The child nodes.
    pub nodes: Vec<TemplateNode>,
    /// The span of the fragment.
    pub span: Span,
}

/// A template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// An element, component, slot outlet or `<template>`.
    Element(Element),
    /// Static text.
    Text(Text),
    /// An HTML comment.
    Comment(Comment),
    /// `{{ expression }}`.
    Interpolation(Interpolation),
    /// A `v-if` / `v-else-if` / `v-else` chain.
    If(IfNode),
    /// A `v-for` loop.
    For(ForNode),
}

impl TemplateNode {
    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        match self {
            TemplateNode::Element(n) => n.span,
            TemplateNode::Text(n) => n.span,
            TemplateNode::Comment(n) => n.span,
            TemplateNode::Interpolation(n) => n.span,
            TemplateNode::If(n) => n.span,
            TemplateNode::For(n) => n.span,
        }
    }
}

/// The role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    /// A native HTML, SVG or MathML element.
    Element,
    /// A component reference.
    Component,
    /// A `<slot>` outlet.
    Slot,
    /// A `<template>` carrying a structural directive.
    Template,
}

/// An element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// The span from `<` to the end of the closing tag.
    pub span: Span,
    /// The tag name as written.
    pub tag: SmolStr,
    pub tag_type: TagType,
    /// Attributes and directives in source order.
    pub props: Vec<Prop>,
    /// Child nodes.
    pub children: Vec<TemplateNode>,
    /// Whether the element was written as `<tag />`.
    pub self_closing: bool,
    /// Offset past the `>` of the opening tag.
    pub start_tag_end: u32,
}

impl Element {
    /// Offset of the tag name (just after `<`).
    pub fn tag_offset(&self) -> u32 {
        u32::from(self.span.start) + 1
    }

    /// Offset of the tag name in the closing tag, if one was written.
    pub fn end_tag_offset(&self, source: &str) -> Option<u32> {
        if self.self_closing {
            return None;
        }
        let end = u32::from(self.span.end) as usize;
        let head = source.get(..end)?;
        let close = head.rfind("</")?;
        if (close as u32) < self.start_tag_end || !head[close + 2..].starts_with(self.tag.as_str()) {
            return None;
        }
        Some(close as u32 + 2)
    }

    /// Finds a directive by normalised name.
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.props.iter().find_map(|prop| match prop {
            Prop::Directive(dir) if dir.name == name => Some(dir),
            _ => None,
        })
    }

    /// Finds a static attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.props.iter().find_map(|prop| match prop {
            Prop::Attribute(attr) if attr.name == name => Some(attr),
            _ => None,
        })
    }
}

/// An element property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    Attribute(Attribute),
    Directive(Directive),
}

impl Prop {
    pub fn span(&self) -> Span {
        match self {
            Prop::Attribute(attr) => attr.span,
            Prop::Directive(dir) => dir.span,
        }
    }
}

/// A static attribute, e.g. `class="a"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    /// The value; `None` for boolean attributes.
    pub value: Option<AttributeValue>,
    /// The span of the whole attribute.
    pub span: Span,
}

/// A static attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// The value text, without quotes.
    pub content: String,
    /// Offset of the first byte of `content`.
    pub offset: u32,
    pub quoted: bool,
}

/// A directive, e.g. `v-on:click.stop="go"` or `@click.stop="go"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Normalised name without `v-`: `bind`, `on`, `slot`, `model`, ...
    pub name: SmolStr,
    /// The attribute name as written.
    pub raw_name: String,
    pub arg: Option<ExpressionNode>,
    pub exp: Option<ExpressionNode>,
    pub modifiers: Vec<ExpressionNode>,
    /// The span of the whole attribute.
    pub span: Span,
}

/// A piece of template source: a directive argument, modifier or expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionNode {
    pub content: String,
    /// Offset of the first byte of `content`.
    pub offset: u32,
    /// False for expressions and dynamic arguments (`[name]`).
    pub is_static: bool,
}

impl ExpressionNode {
    pub fn new(content: impl Into<String>, offset: u32, is_static: bool) -> Self {
        Self {
            content: content.into(),
            offset,
            is_static,
        }
    }

    /// Offset past the last byte of `content`.
    pub fn end(&self) -> u32 {
        self.offset + self.content.len() as u32
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.end())
    }
}

/// Static text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub span: Span,
    pub data: String,
}

/// An HTML comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The span from `<!--` through `-->`.
    pub span: Span,
    /// The text between the delimiters.
    pub data: String,
}

/// `{{ expression }}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation {
    pub span: Span,
    /// The text between the braces.
    pub expression: ExpressionNode,
}

/// A folded `v-if` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfNode {
    pub span: Span,
    pub branches: Vec<IfBranch>,
}

/// One branch of a `v-if` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBranch {
    pub span: Span,
    /// The condition; `None` for `v-else`.
    pub condition: Option<ExpressionNode>,
    /// The branch element, or the children of an unwrapped `<template>`.
    pub children: Vec<TemplateNode>,
}

/// A folded `v-for` loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForNode {
    pub span: Span,
    /// The iterated expression, after `in`/`of`.
    pub source: Option<ExpressionNode>,
    pub value: Option<ExpressionNode>,
    pub key: Option<ExpressionNode>,
    pub index: Option<ExpressionNode>,
    /// The element, or the children of an unwrapped `<template>`.
    pub children: Vec<TemplateNode>,
}

impl ForNode {
    /// The source range covering every declared alias, from the first to the last.
    pub fn alias_span(&self) -> Option<Span> {
        let first = self.value.as_ref().or(self.key.as_ref()).or(self.index.as_ref())?;
        let last = self.index.as_ref().or(self.key.as_ref()).or(self.value.as_ref())?;
        Some(Span::new(first.offset, last.end()))
    }
}
