//! `<slot>` outlets.
//!
//! With `defineSlots` the outlet props are checked against the declared
//! slot. Otherwise each outlet contributes to the inferred `__VLS_Slots`.

use super::context::{DynamicSlot, SlotEntry, TemplateContext};
use crate::emit::source;
use crate::features;
use crate::names::{helper, value};
use vue_parser::{Element, Prop};

impl<'a> TemplateContext<'a> {
    pub fn slot_outlet(&mut self, element: &'a Element) {
        let start = element.tag_offset();
        let end = start + element.tag.len() as u32;
        let props_var = self.internal_variable();
        let name_prop = element.props.iter().find(|prop| match prop {
            Prop::Attribute(attribute) => attribute.name == "name",
            Prop::Directive(directive) => {
                directive.name == "bind" && directive.arg.as_ref().is_some_and(|arg| arg.content == "name")
            }
        });

        if self.options.has_define_slots {
            let slots = self
                .options
                .slots_assign_name
                .clone()
                .unwrap_or_else(|| value::SLOTS.to_string());
            self.codes.text(format!("{}(", helper::AS_FUNCTIONAL_SLOT));
            match name_prop {
                Some(prop) => {
                    let span = prop.span();
                    let boundary = self.codes.open(source::TEMPLATE, span.start.into(), features::VERIFICATION);
                    self.codes.text(slots);
                    match prop {
                        Prop::Attribute(attribute) => match &attribute.value {
                            Some(name) => self.property_access(&name.content, name.offset, features::VERIFICATION),
                            None => self.codes.text("[\"default\"]"),
                        },
                        Prop::Directive(directive) => {
                            self.codes.text("[");
                            self.prop_exp(directive);
                            self.codes.text("]");
                        }
                    }
                    self.codes.close(boundary, span.end.into());
                }
                None => {
                    let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
                    self.codes.text(format!("{slots}["));
                    self.codes
                        .bounded(source::TEMPLATE, start, end, features::VERIFICATION, "\"default\"");
                    self.codes.text("]");
                    self.codes.close(boundary, end);
                }
            }
            self.codes.text(")(");
            let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
            self.codes.text("{\n");
            let props: Vec<&Prop> = element
                .props
                .iter()
                .filter(|prop| !name_prop.is_some_and(|name| std::ptr::eq(*prop, name)))
                .collect();
            self.element_props(element, &props, true, &mut Vec::new());
            self.codes.text("}");
            self.codes.close(boundary, end);
            self.codes.text(");\n");
        } else {
            self.codes.text(format!("var {props_var} = {{\n"));
            let props: Vec<&Prop> = element.props.iter().collect();
            let check_unknown_props = self.options.compiler.check_unknown_props;
            self.element_props(element, &props, check_unknown_props, &mut Vec::new());
            self.codes.text("};\n");

            let static_name = match name_prop {
                Some(Prop::Attribute(attribute)) => attribute.value.as_ref(),
                _ => None,
            };
            let dynamic_name = match name_prop {
                Some(Prop::Directive(directive)) => directive.exp.as_ref(),
                _ => None,
            };
            if let Some(name) = static_name {
                let props_var = self.hoist_variable(&props_var);
                self.slots.push(SlotEntry {
                    name: name.content.clone(),
                    offset: Some(name.offset),
                    props_var,
                });
            } else if let Some(exp) = dynamic_name {
                let exp_var = self.internal_variable();
                self.codes.text(format!("var {exp_var} = {}(", helper::TRY_AS_CONSTANT));
                self.interpolation(source::TEMPLATE, &exp.content, exp.offset, features::VERIFICATION, "", "");
                self.codes.text(");\n");
                let exp_var = self.hoist_variable(&exp_var);
                let props_var = self.hoist_variable(&props_var);
                self.dynamic_slots.push(DynamicSlot { exp_var, props_var });
            } else {
                let props_var = self.hoist_variable(&props_var);
                self.slots.push(SlotEntry {
                    name: "default".to_string(),
                    offset: None,
                    props_var,
                });
            }
        }

        for child in &element.children {
            self.child(child);
        }
    }
}
