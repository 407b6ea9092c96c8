//! Custom and built-in directives other than `v-bind`, `v-on`, `v-model`
//! and `v-slot`.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::names::{helper, value};
use crate::text;
use vue_parser::{Directive, Element, Prop};

const BUILTIN_DIRECTIVES: &[&str] = &[
    "bind", "cloak", "else-if", "else", "for", "html", "if", "model", "on", "once", "pre", "show", "slot", "text",
    "memo",
];

impl TemplateContext<'_> {
    pub(crate) fn element_directives(&mut self, element: &Element) {
        for prop in &element.props {
            let Prop::Directive(directive) = prop else {
                continue;
            };
            if matches!(directive.name.as_str(), "slot" | "on" | "model" | "bind") {
                continue;
            }
            let boundary = self.codes.open(source::TEMPLATE, directive.span.start.into(), features::VERIFICATION);
            self.codes.text(format!("{}(", helper::AS_FUNCTIONAL_DIRECTIVE));
            self.directive_identifier(directive);
            self.codes.text(format!(
                ", {{}} as import(\"{}\").ObjectDirective)(null!, {{ ...{}, ",
                self.options.compiler.lib,
                helper::DIRECTIVE_BINDING_REST_FIELDS
            ));
            self.directive_arg(directive);
            self.modifiers(directive, "modifiers");
            self.directive_value(directive);
            self.codes.text(" }, null!, null!)");
            self.codes.close(boundary, directive.span.end.into());
            self.codes.text(";\n");
        }
    }

    fn directive_identifier(&mut self, directive: &Directive) {
        let raw_name = format!("v-{}", directive.name);
        let start = u32::from(directive.span.start);
        let builtin = BUILTIN_DIRECTIVES.contains(&directive.name.as_str());
        let info = if self.options.compiler.check_unknown_directives && !builtin {
            features::VERIFICATION
        } else {
            features::NONE
        };

        let boundary = self.codes.open(source::TEMPLATE, start, features::VERIFICATION);
        self.codes.text(format!("{}.", value::DIRECTIVES));
        self.codes.camelized(&raw_name, source::TEMPLATE, start, info, None);
        self.codes.close(boundary, start + raw_name.len() as u32);

        if !builtin {
            self.access_variable(&text::camelize(&raw_name));
        }
    }

    fn directive_arg(&mut self, directive: &Directive) {
        let Some(arg) = &directive.arg else {
            return;
        };
        self.codes
            .bounded(source::TEMPLATE, arg.offset, arg.end(), features::VERIFICATION, "arg");
        self.codes.text(": ");
        if arg.is_static {
            self.codes
                .string_literal_key(&arg.content, Some((source::TEMPLATE, arg.offset, features::VERIFICATION)));
        } else {
            self.interpolation(source::TEMPLATE, &arg.content, arg.offset, features::VERIFICATION, "(", ")");
        }
        self.codes.text(", ");
    }

    /// `name: { modifier: true, ... }, ` for the modifiers of `directive`.
    pub(crate) fn modifiers(&mut self, directive: &Directive, property_name: &str) {
        let (Some(first), Some(last)) = (directive.modifiers.first(), directive.modifiers.last()) else {
            return;
        };
        self.codes.bounded(
            source::TEMPLATE,
            first.offset - 1,
            last.end(),
            features::VERIFICATION,
            property_name.to_string(),
        );
        self.codes.text(": { ");
        for modifier in &directive.modifiers {
            self.object_property(&modifier.content, modifier.offset, features::VERIFICATION, false, false);
            self.codes.text(": true, ");
        }
        self.codes.text("}, ");
    }

    fn directive_value(&mut self, directive: &Directive) {
        let Some(exp) = &directive.exp else {
            return;
        };
        self.codes
            .bounded(source::TEMPLATE, exp.offset, exp.end(), features::VERIFICATION, "value");
        self.codes.text(": ");
        self.prop_exp(directive);
    }
}

#[cfg(test)]
mod tests {
    use crate::options::VueCompilerOptions;
    use crate::template::{generate_template, TemplateOptions};
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_custom_directive() {
        let template = "<input v-focus:top.once=\"ready\">";
        let fragment = vue_parser::parse_template(template).fragment;
        let compiler = VueCompilerOptions::default();
        let names = FxHashSet::default();
        let options = TemplateOptions::new(&compiler, &names, &names);
        let output = generate_template(&options, template, Some(&fragment));
        let text = output.codes.to_text();
        assert!(text.contains(
            "__VLS_asFunctionalDirective(__VLS_directives.vFocus, {} as import(\"vue\").ObjectDirective)(null!, { ...__VLS_directiveBindingRestFields, arg: \"top\", modifiers: { once: true, }, value: (__VLS_ctx.ready) }, null!, null!);\n"
        ));
        assert_eq!(
            output.accessed_vars.iter().map(|name| name.as_str()).collect::<Vec<_>>(),
            vec!["vFocus", "ready"]
        );
    }

    #[test]
    fn test_show_is_builtin() {
        let template = "<div v-show=\"visible\"></div>";
        let fragment = vue_parser::parse_template(template).fragment;
        let compiler = VueCompilerOptions::default();
        let names = FxHashSet::default();
        let options = TemplateOptions::new(&compiler, &names, &names);
        let output = generate_template(&options, template, Some(&fragment));
        assert!(output.codes.to_text().contains("__VLS_directives.vShow"));
        assert!(!output.accessed_vars.contains("vShow"));
    }
}
