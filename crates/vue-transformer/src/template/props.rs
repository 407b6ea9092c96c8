//! The object literal of props passed to an element or component.

use super::context::TemplateContext;
use super::element::FailedExpression;
use crate::emit::source;
use crate::features;
use crate::names::{helper, value};
use crate::options::ModelPropTarget;
use crate::text;
use vue_parser::{Directive, Element, Prop, TagType};

impl TemplateContext<'_> {
    /// Writes one `key: value,` line per prop. Expressions that cannot be
    /// written as a prop go to `failed`.
    pub(crate) fn element_props(
        &mut self,
        element: &Element,
        props: &[&Prop],
        check_unknown_props: bool,
        failed: &mut Vec<FailedExpression>,
    ) {
        let is_component = element.tag_type == TagType::Component;

        for prop in props {
            let Prop::Directive(directive) = prop else {
                continue;
            };
            if directive.name != "on" {
                continue;
            }
            match (&directive.arg, &directive.exp) {
                (Some(arg), _) if arg.is_static => {
                    if is_component {
                        let name = text::camelize(&format!("on-{}", arg.content));
                        self.codes.text(format!("...{{ \"{name}\": {{}} as any }},"));
                    } else {
                        self.codes.text("...{");
                        self.event_arg(&arg.content, arg.offset, "on", None);
                        self.codes.text(": ");
                        self.event_expression(directive);
                        self.codes.text("},");
                    }
                    self.codes.text("\n");
                }
                (Some(arg), Some(exp)) => {
                    failed.push(FailedExpression {
                        code: format!("[{}]", arg.content),
                        offset: arg.offset - 1,
                        prefix: "(",
                        suffix: ")",
                    });
                    failed.push(FailedExpression {
                        code: exp.content.clone(),
                        offset: exp.offset,
                        prefix: "() => {",
                        suffix: "}",
                    });
                }
                (None, Some(exp)) => failed.push(FailedExpression {
                    code: exp.content.clone(),
                    offset: exp.offset,
                    prefix: "(",
                    suffix: ")",
                }),
                _ => {}
            }
        }

        let info = features::excess_property(check_unknown_props);
        for prop in props {
            match prop {
                Prop::Directive(directive)
                    if directive.name == "model" || (directive.name == "bind" && directive.arg.is_some()) =>
                {
                    let prop_name = match &directive.arg {
                        Some(arg) if arg.is_static => Some(arg.content.clone()),
                        Some(arg) => Some(format!("[{}]", arg.content)),
                        None => self.model_prop_name(element),
                    };
                    let Some(prop_name) = prop_name.filter(|name| !self.data_attributes.is_match(name)) else {
                        if let Some(exp) = &directive.exp {
                            failed.push(FailedExpression {
                                code: exp.content.clone(),
                                offset: exp.offset,
                                prefix: "(",
                                suffix: ")",
                            });
                        }
                        continue;
                    };

                    let spread = prop_name == "style" || prop_name == "class";
                    let camelize = self.should_camelize(element, prop, &prop_name);
                    if spread {
                        self.codes.text("...{ ");
                    }
                    let boundary = self.codes.open(source::TEMPLATE, directive.span.start.into(), features::VERIFICATION);
                    match &directive.arg {
                        Some(arg) => {
                            let offset = if arg.is_static { arg.offset } else { arg.offset - 1 };
                            self.object_property(&prop_name, offset, info, camelize, false);
                        }
                        None => {
                            let start = u32::from(directive.span.start);
                            self.codes.bounded(
                                source::TEMPLATE,
                                start,
                                start + "v-model".len() as u32,
                                features::VERIFICATION,
                                prop_name.clone(),
                            );
                        }
                    }
                    self.codes.text(": ");
                    let (value_start, value_end) = match &directive.arg {
                        Some(arg) if arg.is_static => (arg.offset, arg.end()),
                        Some(arg) => (arg.offset - 1, arg.end() + 1),
                        None => (directive.span.start.into(), directive.span.end.into()),
                    };
                    let value = self.codes.open(source::TEMPLATE, value_start, features::VERIFICATION);
                    self.prop_exp(directive);
                    self.codes.close(value, value_end);
                    self.codes.close(boundary, directive.span.end.into());
                    if spread {
                        self.codes.text(" }");
                    }
                    self.codes.text(",\n");

                    if is_component && directive.name == "model" && !directive.modifiers.is_empty() {
                        let property_name = match &directive.arg {
                            Some(arg) if !arg.is_static => {
                                format!("[{}(`${{{}}}Modifiers`)]", helper::TRY_AS_CONSTANT, arg.content)
                            }
                            Some(_) => format!("{}Modifiers", text::camelize(&prop_name)),
                            None => "modelModifiers".to_string(),
                        };
                        self.modifiers(directive, &property_name);
                        self.codes.text("\n");
                    }
                }
                Prop::Attribute(attribute) => {
                    if self.data_attributes.is_match(attribute.name.as_str()) {
                        continue;
                    }
                    let spread = attribute.name == "style" || attribute.name == "class";
                    let camelize = self.should_camelize(element, prop, &attribute.name);
                    if spread {
                        self.codes.text("...{ ");
                    }
                    let start = u32::from(attribute.span.start);
                    let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
                    self.object_property(&attribute.name, start, info, camelize, false);
                    self.codes.text(": ");
                    match &attribute.value {
                        _ if attribute.name == "style" => self.codes.text("{}"),
                        Some(value) => {
                            let before = value.offset.checked_sub(1).and_then(|at| self.source.as_bytes().get(at as usize));
                            let quote = match before {
                                Some(b'\'') if value.quoted => "'",
                                _ => "\"",
                            };
                            self.codes.text(quote);
                            self.codes
                                .unicode(&value.content, source::TEMPLATE, value.offset, features::VERIFICATION);
                            self.codes.text(quote);
                        }
                        None => self.codes.text("true"),
                    }
                    self.codes.close(boundary, attribute.span.end.into());
                    if spread {
                        self.codes.text(" }");
                    }
                    self.codes.text(",\n");
                }
                Prop::Directive(directive) if directive.name == "bind" => {
                    let Some(exp) = &directive.exp else {
                        continue;
                    };
                    if exp.content == "$attrs" {
                        failed.push(FailedExpression {
                            code: exp.content.clone(),
                            offset: exp.offset,
                            prefix: "(",
                            suffix: ")",
                        });
                    } else {
                        let boundary = self.codes.open(source::TEMPLATE, directive.span.start.into(), features::VERIFICATION);
                        self.codes.text("...");
                        self.prop_exp(directive);
                        self.codes.close(boundary, exp.end());
                        self.codes.text(",\n");
                    }
                }
                Prop::Directive(_) => {}
            }
        }
    }

    /// The value of a bound prop. A `:name` shorthand reads the variable of
    /// the same name.
    pub(crate) fn prop_exp(&mut self, directive: &Directive) {
        if let Some(exp) = &directive.exp {
            self.interpolation(source::TEMPLATE, &exp.content, exp.offset, features::VERIFICATION, "(", ")");
            return;
        }
        let shorthand = directive
            .arg
            .as_ref()
            .filter(|arg| directive.name == "bind" && arg.is_static)
            .map(|arg| (arg, text::camelize(&arg.content)))
            .filter(|(_, name)| text::is_identifier(name));
        let Some((arg, name)) = shorthand else {
            self.codes.text("{}");
            return;
        };

        if self.is_declared(&name) {
            self.codes.camelized(&arg.content, source::TEMPLATE, arg.offset, features::VERIFICATION, None);
        } else if self.options.setup_refs.contains(name.as_str()) {
            self.codes.camelized(&arg.content, source::TEMPLATE, arg.offset, features::VERIFICATION, None);
            self.codes.text(".value");
        } else {
            self.access_variable(&name);
            self.codes.text(format!("{}.", value::CTX));
            self.codes.camelized(&arg.content, source::TEMPLATE, arg.offset, features::VERIFICATION, None);
        }
    }

    fn should_camelize(&self, element: &Element, prop: &Prop, name: &str) -> bool {
        let static_name = match prop {
            Prop::Attribute(_) => true,
            Prop::Directive(directive) => directive.arg.as_ref().is_some_and(|arg| arg.is_static),
        };
        matches!(element.tag_type, TagType::Component | TagType::Slot)
            && static_name
            && text::hyphenate_attr(name) == name
            && !self.html_attributes.is_match(name)
    }

    /// The prop a `v-model` without argument binds. `None` when the element
    /// has no model prop.
    fn model_prop_name(&self, element: &Element) -> Option<String> {
        let hyphenated = text::hyphenate(&element.tag);
        let attr = |name: &str| {
            element
                .attribute(name)
                .and_then(|attribute| attribute.value.as_ref())
                .map(|value| value.content.as_str())
        };
        let named = |model: &str| (!model.is_empty()).then(|| model.to_string());
        let models = &self.options.compiler.experimental_model_prop_name;
        let target = |model: usize| {
            models
                .get_index(model)
                .and_then(|(_, tags)| tags.get(element.tag.as_str()).or_else(|| tags.get(hyphenated.as_str())))
        };

        for (index, (model, _)) in models.iter().enumerate() {
            if let Some(target @ (ModelPropTarget::Attrs(_) | ModelPropTarget::AnyOf(_))) = target(index) {
                if target.matches(attr) {
                    return named(model);
                }
            }
        }
        for (index, (model, _)) in models.iter().enumerate() {
            if let Some(ModelPropTarget::Always(true)) = target(index) {
                return named(model);
            }
        }
        Some("modelValue".to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::options::VueCompilerOptions;
    use crate::template::{generate_template, TemplateOptions};
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;

    fn generate(template: &str) -> String {
        let fragment = vue_parser::parse_template(template).fragment;
        let compiler = VueCompilerOptions::default();
        let names = FxHashSet::default();
        let options = TemplateOptions::new(&compiler, &names, &names);
        generate_template(&options, template, Some(&fragment)).codes.to_text()
    }

    #[test]
    fn test_bound_and_static_props() {
        let text = generate("<Comp :my-prop=\"value\" title='hi' disabled></Comp>");
        assert!(text.contains("myProp: (__VLS_ctx.value),\n"));
        assert!(text.contains("title: 'hi',\n"));
        assert!(text.contains("disabled: true,\n"));
    }

    #[test]
    fn test_class_and_style_are_spread() {
        let text = generate("<div class=\"a\" :style=\"s\"></div>");
        assert!(text.contains("...{ class: \"a\" },\n"));
        assert!(text.contains("...{ style: (__VLS_ctx.s) },\n"));
    }

    #[test]
    fn test_model_prop_names() {
        assert!(generate("<input type=\"text\" v-model=\"text\">").contains("value: (__VLS_ctx.text),\n"));
        let untyped = generate("<input v-model=\"text\">");
        assert!(!untyped.contains("value:"));
        assert!(untyped.contains("(__VLS_ctx.text);\n"));
        assert!(generate("<Comp v-model=\"text\"></Comp>").contains("modelValue: (__VLS_ctx.text),\n"));
        assert!(generate("<textarea v-model=\"text\"></textarea>").contains("value: (__VLS_ctx.text),\n"));
    }

    #[test]
    fn test_same_name_shorthand() {
        let text = generate("<Comp :user-id />");
        assert!(text.contains("userId: __VLS_ctx.userId,\n"));
    }

    #[test]
    fn test_attrs_spread_is_checked_alone() {
        let text = generate("<div v-bind=\"$attrs\" v-bind:[key]=\"v\"></div>");
        assert!(text.contains("(__VLS_ctx.$attrs);\n"));
        assert!(text.contains("[__VLS_ctx.key]: (__VLS_ctx.v),\n"));
    }

    #[test]
    fn test_aria_attributes_keep_their_name() {
        let text = generate("<Comp aria-label=\"x\"></Comp>");
        assert_eq!(text.matches("\"aria-label\": \"x\"").count(), 2);
    }
}
