//! Mutable state of one template (or style) generation.

use super::TemplateOptions;
use crate::emit::{source, Codes, FrameEffect};
use crate::names;
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::{CodeInfo, Verification};
use vue_parser::{Comment, TemplateNode};

/// Literal text given by `<!-- @vue-generic {...} -->`.
#[derive(Debug, Clone)]
pub(crate) struct Generic {
    pub content: String,
    /// Offset of `content` in the template.
    pub offset: u32,
}

#[derive(Debug, Clone, Copy)]
struct Expectation {
    frame: u32,
    start: u32,
    end: u32,
}

/// Effects of the directive comments in front of one node.
#[derive(Debug, Default)]
struct Frame {
    ignore: bool,
    expect: Option<Expectation>,
    generic: Option<Generic>,
}

/// A `<slot>` outlet with a static name.
#[derive(Debug)]
pub(crate) struct SlotEntry {
    pub name: String,
    /// Offset of the name, `None` for the implicit default slot.
    pub offset: Option<u32>,
    pub props_var: String,
}

/// A `<slot :name="...">` outlet.
#[derive(Debug)]
pub(crate) struct DynamicSlot {
    pub exp_var: String,
    pub props_var: String,
}

#[derive(Debug)]
pub(crate) struct TemplateRef {
    pub type_exp: String,
    pub offset: u32,
}

/// The component whose children are being generated.
#[derive(Debug)]
pub(crate) struct ComponentScope {
    ctx_var: String,
    props_var: String,
    ctx_used: bool,
    props_used: bool,
}

pub(crate) struct TemplateContext<'a> {
    pub options: &'a TemplateOptions<'a>,
    /// Template block content.
    pub source: &'a str,
    pub codes: Codes,
    pub data_attributes: GlobSet,
    pub html_attributes: GlobSet,
    scopes: Vec<FxHashSet<SmolStr>>,
    frames: Vec<Frame>,
    pending_comments: Vec<&'a Comment>,
    next_variable: u32,
    next_expectation: u32,
    pub in_v_for: bool,
    components: Vec<ComponentScope>,
    /// Guards of the enclosing `v-if` branches, in generated form.
    pub conditions: Vec<String>,
    pub accessed_vars: IndexSet<SmolStr>,
    pub dollar_vars: IndexSet<&'static str>,
    hoist_vars: IndexMap<String, String>,
    pub single_root_el_types: IndexSet<String>,
    /// Offsets of the elements that are the single root of the template.
    /// `None` records that some branch has several roots.
    pub single_root_nodes: FxHashSet<Option<u32>>,
    pub inherited_attr_vars: IndexSet<String>,
    pub slots: Vec<SlotEntry>,
    pub dynamic_slots: Vec<DynamicSlot>,
    pub template_refs: IndexMap<String, Vec<TemplateRef>>,
    /// Tags resolved as components.
    pub components_used: IndexSet<SmolStr>,
    pub generated_types: FxHashSet<&'static str>,
}

fn glob_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(error) => tracing::debug!(pattern, %error, "ignoring invalid attribute pattern"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Splits `<!-- @vue-name content -->` into name and content.
fn comment_directive(comment: &Comment) -> Option<(&str, &str)> {
    let rest = comment.data.trim_start().strip_prefix("@vue-")?;
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    (name_len > 0).then(|| rest.split_at(name_len))
}

impl<'a> TemplateContext<'a> {
    pub fn new(options: &'a TemplateOptions<'a>, source: &'a str, codes: Codes) -> Self {
        Self {
            options,
            source,
            codes,
            data_attributes: glob_set(&options.compiler.data_attributes),
            html_attributes: glob_set(&options.compiler.html_attributes),
            scopes: Vec::new(),
            frames: Vec::new(),
            pending_comments: Vec::new(),
            next_variable: 0,
            next_expectation: 0,
            in_v_for: false,
            components: Vec::new(),
            conditions: Vec::new(),
            accessed_vars: IndexSet::new(),
            dollar_vars: IndexSet::new(),
            hoist_vars: IndexMap::new(),
            single_root_el_types: IndexSet::new(),
            single_root_nodes: FxHashSet::default(),
            inherited_attr_vars: IndexSet::new(),
            slots: Vec::new(),
            dynamic_slots: Vec::new(),
            template_refs: IndexMap::new(),
            components_used: IndexSet::new(),
            generated_types: FxHashSet::default(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares names in the innermost scope.
    pub fn declare<S: Into<SmolStr>>(&mut self, names: impl IntoIterator<Item = S>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.extend(names.into_iter().map(Into::into));
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    pub fn access_variable(&mut self, name: &str) {
        if !self.accessed_vars.contains(name) {
            self.accessed_vars.insert(SmolStr::new(name));
        }
    }

    pub fn internal_variable(&mut self) -> String {
        let name = names::temporary(self.next_variable);
        self.next_variable += 1;
        name
    }

    /// A module-level alias of a block-scoped variable, declared by
    /// [`hoist_variables`](Self::hoist_variables).
    pub fn hoist_variable(&mut self, original: &str) -> String {
        if let Some(name) = self.hoist_vars.get(original) {
            return name.clone();
        }
        let name = self.internal_variable();
        self.hoist_vars.insert(original.to_string(), name.clone());
        name
    }

    pub fn hoist_variables(&mut self) {
        if self.hoist_vars.is_empty() {
            return;
        }
        let mut line = String::from("// @ts-ignore\nvar ");
        for (original, hoisted) in &self.hoist_vars {
            line.push_str(&format!("{hoisted} = {original}, "));
        }
        line.push_str(";\n");
        self.codes.text(line);
    }

    pub fn add_template_ref(&mut self, name: &str, type_exp: String, offset: u32) {
        self.template_refs
            .entry(name.to_string())
            .or_default()
            .push(TemplateRef { type_exp, offset });
    }

    /// Writes an early return for every enclosing `v-if` guard.
    pub fn condition_guards(&mut self) {
        for condition in &self.conditions {
            self.codes.text(format!("if (!{condition}) return;\n"));
        }
    }

    pub fn enter_component(&mut self, ctx_var: String, props_var: String) {
        self.components.push(ComponentScope {
            ctx_var,
            props_var,
            ctx_used: false,
            props_used: false,
        });
    }

    /// Leaves the current component, returning whether its context and props
    /// variables were referenced.
    pub fn exit_component(&mut self) -> (bool, bool) {
        self.components
            .pop()
            .map_or((false, false), |scope| (scope.ctx_used, scope.props_used))
    }

    pub fn in_component(&self) -> bool {
        !self.components.is_empty()
    }

    /// The context variable of the current component, marked as used.
    pub fn component_ctx_var(&mut self) -> String {
        match self.components.last_mut() {
            Some(scope) => {
                scope.ctx_used = true;
                scope.ctx_var.clone()
            }
            None => "{}".to_string(),
        }
    }

    /// The props variable of the current component, marked as used.
    pub fn component_props_var(&mut self) -> String {
        match self.components.last_mut() {
            Some(scope) => {
                scope.props_used = true;
                scope.props_var.clone()
            }
            None => "{}".to_string(),
        }
    }

    /// The `@vue-generic` text applying to the current node.
    pub fn current_generic(&self) -> Option<Generic> {
        self.frames.last().and_then(|frame| frame.generic.clone())
    }

    /// Runs `generate` against an empty buffer and returns what it wrote.
    pub fn capture(&mut self, generate: impl FnOnce(&mut Self)) -> Codes {
        let scratch = Codes::continue_from(&self.codes);
        let outer = std::mem::replace(&mut self.codes, scratch);
        generate(self);
        let captured = std::mem::replace(&mut self.codes, outer);
        self.codes.absorb_tokens(&captured);
        captured
    }

    /// Starts a node. Comments are buffered for the next node; returns
    /// false when nothing should be generated for `node`.
    pub fn enter(&mut self, node: &'a TemplateNode) -> bool {
        if let TemplateNode::Comment(comment) = node {
            self.pending_comments.push(comment);
            return false;
        }

        let mut frame = Frame::default();
        for comment in std::mem::take(&mut self.pending_comments) {
            let Some((name, content)) = comment_directive(comment) else {
                continue;
            };
            match name {
                "skip" => return false,
                "ignore" => frame.ignore = true,
                "expect-error" => {
                    frame.expect = Some(Expectation {
                        frame: self.next_expectation,
                        start: comment.span.start.into(),
                        end: comment.span.end.into(),
                    });
                    self.next_expectation += 1;
                }
                "generic" => {
                    let text = content.trim();
                    if text.len() >= 2 && text.starts_with('{') && text.ends_with('}') {
                        if let Some(brace) = comment.data.find('{') {
                            frame.generic = Some(Generic {
                                content: text[1..text.len() - 1].to_string(),
                                offset: u32::from(comment.span.start) + "<!--".len() as u32 + brace as u32 + 1,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        self.frames.push(frame);
        self.refresh_effect();
        true
    }

    /// Ends the node started by a successful [`enter`](Self::enter).
    pub fn exit(&mut self) {
        let frame = self.frames.pop();
        self.pending_comments.clear();
        self.refresh_effect();

        if let Some(Expectation { frame, start, end }) = frame.and_then(|frame| frame.expect) {
            let marker = CodeInfo::new(Verification::UnusedExpectation { frame, outer: None });
            self.codes.bounded(source::TEMPLATE, start, end, marker, "// @ts-expect-error");
            self.codes.text("\n;\n");
        }
    }

    /// The innermost directive frame decides how segments are verified.
    fn refresh_effect(&mut self) {
        let effect = self.frames.iter().rev().find_map(|frame| {
            if frame.ignore {
                Some(FrameEffect::Ignore)
            } else {
                frame.expect.map(|expect| FrameEffect::Expect(expect.frame))
            }
        });
        self.codes.set_effect(effect);
    }
}
