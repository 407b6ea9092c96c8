//! `v-on` listeners and, with strict `v-model`, model update events.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::names::helper;
use crate::ranges::parse_script;
use crate::text;
use source_map::CodeInfo;
use swc_ecma_ast::{Decl, Expr, ModuleItem, Stmt};
use vue_parser::{Directive, Element, Prop};

impl TemplateContext<'_> {
    /// Checks each listener of a component against its emits.
    pub(crate) fn element_events(&mut self, element: &Element, component_var: &str) {
        let mut emit_var: Option<String> = None;

        for prop in &element.props {
            let Prop::Directive(directive) = prop else {
                continue;
            };
            let static_arg = directive.arg.as_ref().map(|arg| arg.is_static);
            let is_listener = directive.name == "on" && static_arg == Some(true);
            let is_model =
                self.options.compiler.strict_v_model && directive.name == "model" && static_arg != Some(false);
            if !is_listener && !is_model {
                continue;
            }

            let emit_var = match &emit_var {
                Some(name) => name.clone(),
                None => {
                    let name = self.internal_variable();
                    let ctx = self.component_ctx_var();
                    self.codes.text(format!(
                        "let {name}!: {}<typeof {component_var}, typeof {ctx}.emit>;\n",
                        helper::RESOLVE_EMITS
                    ));
                    emit_var = Some(name.clone());
                    name
                }
            };

            let (mut event, mut start) = match &directive.arg {
                Some(arg) => (arg.content.as_str(), arg.offset),
                None => ("model-value", u32::from(directive.span.start)),
            };
            let (mut prop_prefix, mut emit_prefix) = ("on-", "");
            if directive.name == "model" {
                (prop_prefix, emit_prefix) = ("onUpdate:", "update:");
            } else if let Some(rest) = event.strip_prefix("vue:") {
                event = rest;
                start += "vue:".len() as u32;
                (prop_prefix, emit_prefix) = ("onVnode-", "vnode-");
            }
            let prop_name = text::camelize(&format!("{prop_prefix}{event}"));
            let emit_name = format!("{emit_prefix}{event}");
            let camelized_emit_name = text::camelize(&emit_name);

            let normalized = self.internal_variable();
            let props = self.component_props_var();
            self.codes.text(format!(
                "const {normalized}: {}<typeof {props}, typeof {emit_var}, \"{prop_name}\", \"{emit_name}\", \"{camelized_emit_name}\"> = ({{\n",
                helper::NORMALIZE_COMPONENT_EVENT
            ));
            if directive.name == "on" {
                self.event_arg(event, start, &prop_prefix[..prop_prefix.len() - 1], None);
                self.codes.text(": ");
                self.event_expression(directive);
            } else {
                self.codes.text(format!("\"{prop_name}\": "));
                self.model_event_expression(directive);
            }
            self.codes.text("});\n");
        }
    }

    /// The listener key, e.g. `onClick` for `click`.
    pub(crate) fn event_arg(&mut self, name: &str, start: u32, prefix: &str, info: Option<CodeInfo>) {
        let info = info.unwrap_or_else(|| features::excess_property(self.options.compiler.check_unknown_events));
        let name = if prefix.is_empty() {
            name.to_string()
        } else {
            text::capitalize(name)
        };

        let boundary = self.codes.open(source::TEMPLATE, start, info);
        let quoted = !text::is_identifier(&text::camelize(&name));
        if quoted {
            self.codes.text("\"");
        }
        self.codes.text(prefix.to_string());
        self.codes.camelized(&name, source::TEMPLATE, start, features::NONE, Some(boundary));
        if quoted {
            self.codes.text("\"");
        }
        self.codes.close(boundary, start + name.len() as u32);
    }

    /// The listener value. Statements are wrapped in a function taking
    /// `$event`.
    pub(crate) fn event_expression(&mut self, directive: &Directive) {
        let Some(exp) = &directive.exp else {
            self.codes.text("() => {}");
            return;
        };
        if is_compound_expression(&exp.content) {
            self.codes.text("(...[$event]) => {\n");
            self.push_scope();
            self.declare(["$event"]);
            self.condition_guards();
            self.interpolation(source::TEMPLATE, &exp.content, exp.offset, features::VERIFICATION, "", "");
            self.codes.text(";\n");
            self.pop_scope();
            self.codes.text("}");
        } else {
            self.interpolation(source::TEMPLATE, &exp.content, exp.offset, features::VERIFICATION, "(", ")");
        }
    }

    fn model_event_expression(&mut self, directive: &Directive) {
        let Some(exp) = &directive.exp else {
            self.codes.text("() => {}");
            return;
        };
        self.codes.text("(...[$event]) => {\n");
        self.condition_guards();
        self.interpolation(source::TEMPLATE, &exp.content, exp.offset, features::VERIFICATION, "", "");
        self.codes.text(" = $event;\n");
        self.codes.text("}");
    }
}

/// Whether a listener is written as statements rather than a function
/// reference or arrow function.
fn is_compound_expression(code: &str) -> bool {
    let parsed = parse_script(code, "ts");
    let Some(module) = &parsed.module else {
        return false;
    };
    match module.body.as_slice() {
        [] => false,
        [ModuleItem::Stmt(Stmt::Expr(statement))] => {
            !matches!(&*statement.expr, Expr::Arrow(_)) && !is_access_chain(&statement.expr)
        }
        [ModuleItem::Stmt(Stmt::Decl(Decl::Fn(_)))] => false,
        _ => true,
    }
}

fn is_access_chain(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) => true,
        Expr::Member(member) => is_access_chain(&member.obj),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::VueCompilerOptions;
    use crate::template::{generate_template, TemplateOptions};
    use rustc_hash::FxHashSet;

    fn generate(template: &str, compiler: &VueCompilerOptions) -> String {
        let fragment = vue_parser::parse_template(template).fragment;
        let names = FxHashSet::default();
        let options = TemplateOptions::new(compiler, &names, &names);
        generate_template(&options, template, Some(&fragment)).codes.to_text()
    }

    #[test]
    fn test_compound_expressions() {
        assert!(!is_compound_expression("onClick"));
        assert!(!is_compound_expression("handlers.click"));
        assert!(!is_compound_expression("() => go(1)"));
        assert!(!is_compound_expression(""));
        assert!(is_compound_expression("count++"));
        assert!(is_compound_expression("go($event)"));
        assert!(is_compound_expression("a(); b()"));
    }

    #[test]
    fn test_element_listener() {
        let text = generate("<button @click=\"count++\"></button>", &VueCompilerOptions::default());
        assert!(text.contains("...{onClick: (...[$event]) => {\n__VLS_ctx.count++;\n}},\n"));
    }

    #[test]
    fn test_component_listener_resolves_emits() {
        let text = generate("<Comp @update-value=\"onUpdate\" />", &VueCompilerOptions::default());
        assert!(text.contains("...{ \"onUpdateValue\": {} as any },\n"));
        assert!(text.contains("__VLS_ResolveEmits<typeof __VLS_0, typeof __VLS_3.emit>;\n"));
        assert!(text.contains(
            "__VLS_NormalizeComponentEvent<typeof __VLS_4, typeof __VLS_5, \"onUpdateValue\", \"update-value\", \"updateValue\"> = ({\nonUpdateValue: (__VLS_ctx.onUpdate)});\n"
        ));
        assert!(text.contains("var __VLS_3!: __VLS_FunctionalComponentCtx<typeof __VLS_0, typeof __VLS_2>;\n"));
        assert!(text.contains("var __VLS_4!: __VLS_FunctionalComponentProps<typeof __VLS_0, typeof __VLS_2>;\n"));
    }

    #[test]
    fn test_strict_model_events() {
        let compiler = VueCompilerOptions {
            strict_v_model: true,
            ..VueCompilerOptions::default()
        };
        let text = generate("<Comp v-model=\"value\" />", &compiler);
        assert!(text.contains("\"onUpdate:modelValue\": (...[$event]) => {\n__VLS_ctx.value = $event;\n}});\n"));
    }
}
