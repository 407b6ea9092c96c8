//! Components, native elements and `<template>` fragments.
//!
//! Every element becomes a call whose argument is an object literal of its
//! props, so that the type checker validates them against the component or
//! intrinsic element type.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::names::{helper, ty, value};
use crate::text;
use indexmap::IndexSet;
use smol_str::SmolStr;
use vue_parser::{Element, Prop};

/// An expression with no prop to carry it, checked on its own line.
#[derive(Debug)]
pub(crate) struct FailedExpression {
    pub code: String,
    pub offset: u32,
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl<'a> TemplateContext<'a> {
    pub fn component(&mut self, element: &'a Element) {
        let component_var = self.internal_variable();
        let functional_var = self.internal_variable();
        let vnode_var = self.internal_variable();
        let ctx_var = self.internal_variable();
        let props_var = self.internal_variable();
        self.enter_component(ctx_var.clone(), props_var.clone());

        let mut tag: &'a str = &element.tag;
        let mut props: Vec<&'a Prop> = element.props.iter().collect();
        let mut start = element.tag_offset();
        let mut end = element.end_tag_offset(self.source);
        let mut is_expression = tag.contains('.');

        if !is_expression && tag == "component" {
            let is_prop = props.iter().copied().enumerate().find_map(|(index, prop)| match prop {
                Prop::Directive(directive)
                    if directive.name == "bind"
                        && directive.arg.as_ref().is_some_and(|arg| arg.is_static && arg.content == "is") =>
                {
                    directive.exp.as_ref().map(|exp| (index, exp))
                }
                _ => None,
            });
            if let Some((index, exp)) = is_prop {
                props.remove(index);
                tag = &exp.content;
                start = exp.offset;
                end = None;
                is_expression = true;
            }
        }

        if is_expression {
            self.codes.text(format!("const {component_var} = "));
            self.interpolation(source::TEMPLATE, tag, start, features::VERIFICATION, "(", ")");
            if let Some(end) = end {
                self.codes.text(" || ");
                self.interpolation(source::TEMPLATE, tag, end, features::VERIFICATION, "(", ")");
            }
            self.codes.text(";\n");
        } else {
            self.components_used.insert(SmolStr::new(tag));
            let camelized = text::camelize(tag);
            let original_names: IndexSet<String> =
                [text::capitalize(&camelized), camelized, tag.to_string()].into_iter().collect();
            let setup_const = original_names
                .iter()
                .find(|name| self.options.setup_consts.contains(name.as_str()))
                .cloned();

            if let Some(name) = setup_const {
                // The declared name decides the case of the first letter.
                let first_len = tag.chars().next().map_or(0, char::len_utf8);
                let code = format!("{}{}", name.chars().next().unwrap_or_default(), &tag[first_len..]);
                self.codes.text(format!("const {component_var} = "));
                self.codes.camelized(&code, source::TEMPLATE, start, features::VERIFICATION, None);
                if let Some(end) = end {
                    self.codes.text(" || ");
                    self.codes.camelized(&code, source::TEMPLATE, end, features::VERIFICATION, None);
                }
                self.codes.text(";\n");
            } else {
                let export = if original_names.contains(self.options.component_name.as_str()) {
                    format!(", typeof {}", value::EXPORT)
                } else {
                    ", void".to_string()
                };
                let mut declaration = format!(
                    "let {component_var}!: {}<\"{tag}\", {}, {}{export}",
                    helper::WITH_COMPONENT,
                    ty::LOCAL_COMPONENTS,
                    ty::GLOBAL_COMPONENTS
                );
                for name in &original_names {
                    declaration.push_str(&format!(", \"{name}\""));
                }
                declaration.push_str(">[");
                self.codes.text(declaration);
                let info = features::unknown_property(self.options.compiler.check_unknown_components);
                self.codes.string_literal_key(tag, Some((source::TEMPLATE, start, info)));
                self.codes.text("];\n");
            }
        }

        let check_unknown_props = self.options.compiler.check_unknown_props;
        let mut failed = Vec::new();
        let prop_codes = self.capture(|ctx| ctx.element_props(element, &props, check_unknown_props, &mut failed));

        let as_functional = if check_unknown_props {
            helper::AS_FUNCTIONAL_COMPONENT0
        } else {
            helper::AS_FUNCTIONAL_COMPONENT1
        };
        self.codes.text("// @ts-ignore\n");
        self.codes.text(format!(
            "const {functional_var} = {as_functional}({component_var}, new {component_var}({{\n{}}}));\n",
            prop_codes.to_text()
        ));

        self.codes.text("const ");
        self.codes.bounded(
            source::TEMPLATE,
            element.span.start.into(),
            element.span.end.into(),
            features::NO_UNUSED,
            vnode_var.clone(),
        );
        self.codes.text(format!(" = {functional_var}"));
        if let Some(generic) = self.current_generic() {
            let boundary = self.codes.open(source::TEMPLATE, generic.offset, features::VERIFICATION);
            self.codes.text("<");
            self.codes.joined(boundary, generic.content.as_str(), generic.offset);
            self.codes.text(">");
            self.codes.close(boundary, generic.offset + generic.content.len() as u32);
        }
        self.codes.text("(");
        let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
        self.codes.text("{\n");
        self.codes.append(prop_codes);
        self.codes.text("}");
        self.codes.close(boundary, start + tag.len() as u32);
        self.codes.text(format!(
            ", ...{}({functional_var}));\n",
            helper::FUNCTIONAL_COMPONENT_ARGS_REST
        ));

        self.failed_expressions(failed);
        self.element_events(element, &component_var);
        self.element_directives(element);

        let template_ref = self.template_ref(element);
        let is_root = self.is_single_root(element)
            && !self
                .options
                .compiler
                .fallthrough_component_names
                .contains(&text::hyphenate(tag));
        if template_ref.is_some() || is_root {
            let instance_var = self.internal_variable();
            let ctx = self.component_ctx_var();
            let array = if self.in_v_for { "[]" } else { "" };
            self.codes.text(format!(
                "const {instance_var} = {{}} as (Parameters<NonNullable<typeof {ctx}[\"expose\"]>>[0] | null){array};\n"
            ));
            if let Some((name, offset)) = template_ref {
                let type_exp = format!("typeof {}", self.hoist_variable(&instance_var));
                self.add_template_ref(&name, type_exp, offset);
            }
            if is_root {
                self.single_root_el_types
                    .insert(format!("NonNullable<typeof {instance_var}>[\"$el\"]"));
            }
        }

        if self.has_v_bind_attrs(element) {
            let props = self.component_props_var();
            self.inherited_attr_vars.insert(props);
        }

        let slot_dir = element.directive("slot");
        if slot_dir.is_some() || !element.children.is_empty() {
            let ctx = self.component_ctx_var();
            self.v_slot(element, slot_dir, &ctx);
        }

        let (ctx_used, props_used) = self.exit_component();
        if ctx_used {
            self.codes.text(format!(
                "var {ctx_var}!: {}<typeof {component_var}, typeof {vnode_var}>;\n",
                helper::FUNCTIONAL_COMPONENT_CTX
            ));
        }
        if props_used {
            self.codes.text(format!(
                "var {props_var}!: {}<typeof {component_var}, typeof {vnode_var}>;\n",
                helper::FUNCTIONAL_COMPONENT_PROPS
            ));
        }
    }

    pub fn element(&mut self, element: &'a Element) {
        let start = element.tag_offset();
        let end = element.end_tag_offset(self.source);
        let check_unknown_props = self.options.compiler.check_unknown_props;
        let as_functional = if check_unknown_props {
            helper::AS_FUNCTIONAL_ELEMENT0
        } else {
            helper::AS_FUNCTIONAL_ELEMENT1
        };

        self.codes.text(format!("{as_functional}({}", value::INTRINSICS));
        self.property_access(&element.tag, start, features::VERIFICATION);
        if let Some(end) = end {
            self.codes.text(format!(", {}", value::INTRINSICS));
            self.property_access(&element.tag, end, features::VERIFICATION);
        }
        self.codes.text(")(");
        let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
        self.codes.text("{\n");
        let props: Vec<&Prop> = element.props.iter().collect();
        let mut failed = Vec::new();
        self.element_props(element, &props, check_unknown_props, &mut failed);
        self.codes.text("}");
        self.codes.close(boundary, start + element.tag.len() as u32);
        self.codes.text(");\n");

        self.failed_expressions(failed);
        self.element_directives(element);

        let elements = helper::ELEMENTS;
        let tag = &element.tag;
        if let Some((name, offset)) = self.template_ref(element) {
            let array = if self.in_v_for { "[]" } else { "" };
            self.add_template_ref(&name, format!("{elements}[\"{tag}\"]{array}"), offset);
        }
        if self.is_single_root(element) {
            self.single_root_el_types.insert(format!("{elements}[\"{tag}\"]"));
        }
        if self.has_v_bind_attrs(element) {
            self.inherited_attr_vars.insert(format!("{}.{tag}", value::INTRINSICS));
        }

        for child in &element.children {
            self.child(child);
        }
    }

    /// A `<template>` without a slot. Props only appear with `v-for` keys.
    pub fn fragment(&mut self, element: &'a Element) {
        if !element.props.is_empty() {
            let start = element.tag_offset();
            let check_unknown_props = self.options.compiler.check_unknown_props;
            let as_functional = if check_unknown_props {
                helper::AS_FUNCTIONAL_ELEMENT0
            } else {
                helper::AS_FUNCTIONAL_ELEMENT1
            };
            self.codes.text(format!("{as_functional}({}.template)(", value::INTRINSICS));
            let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
            self.codes.text("{\n");
            let props: Vec<&Prop> = element.props.iter().collect();
            self.element_props(element, &props, check_unknown_props, &mut Vec::new());
            self.codes.text("}");
            self.codes.close(boundary, start + element.tag.len() as u32);
            self.codes.text(");\n");
        }
        for child in &element.children {
            self.child(child);
        }
    }

    pub(crate) fn failed_expressions(&mut self, failed: Vec<FailedExpression>) {
        for expression in failed {
            self.interpolation(
                source::TEMPLATE,
                &expression.code,
                expression.offset,
                features::VERIFICATION,
                expression.prefix,
                expression.suffix,
            );
            self.codes.text(";\n");
        }
    }

    /// The static `ref` name and the offset of its value.
    fn template_ref(&mut self, element: &Element) -> Option<(String, u32)> {
        let value = element.attribute("ref")?.value.as_ref()?;
        if text::is_identifier(&value.content) && !self.options.setup_refs.contains(value.content.as_str()) {
            self.access_variable(&value.content);
        }
        Some((value.content.clone(), value.offset))
    }

    /// Whether the attributes passed to the component end up on `element`.
    fn has_v_bind_attrs(&self, element: &Element) -> bool {
        self.options.compiler.fallthrough_attributes
            && ((self.options.inherit_attrs && self.is_single_root(element))
                || element.props.iter().any(|prop| {
                    matches!(prop, Prop::Directive(directive)
                        if directive.name == "bind"
                            && directive.exp.as_ref().is_some_and(|exp| exp.content == "$attrs"))
                }))
    }
}
