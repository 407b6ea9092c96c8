//! The `defineComponent` call describing the component to its users.

use super::{LocalType, ScriptGenerator, ScriptSource};
use crate::names::{helper, ty, value};
use crate::ranges::ScriptSetupRanges;

impl ScriptGenerator<'_> {
    pub(super) fn component(&mut self, setup: ScriptSource<'_, ScriptSetupRanges>) {
        let ranges = setup.ranges;
        let compiler = self.compiler();
        self.codes
            .text(format!("(await import(\"{}\")).defineComponent({{\n", compiler.lib));

        if ranges.define_expose.is_some() {
            self.codes.text(format!("setup: () => {},\n", value::EXPOSED));
        }

        let has_emits_option = self.emits_option(ranges);
        self.props_option(setup, has_emits_option);

        if compiler.target >= 3.5 && compiler.infer_component_dollar_refs && self.has_template_type(ty::TEMPLATE_REFS) {
            self.codes.text(format!("__typeRefs: {{}} as {},\n", ty::TEMPLATE_REFS));
        }
        if compiler.target >= 3.5 && compiler.infer_component_dollar_el && self.has_template_type(ty::ROOT_EL) {
            self.codes.text(format!("__typeEl: {{}} as {},\n", ty::ROOT_EL));
        }
        self.codes.text("})");
    }

    /// Returns true when an emits option was written.
    fn emits_option(&mut self, ranges: &ScriptSetupRanges) -> bool {
        let has_runtime_arg = ranges
            .define_emits
            .as_ref()
            .is_some_and(|emits| emits.call.arg.is_some());

        let mut type_codes = Vec::new();
        if self.compiler().target >= 3.5 && !has_runtime_arg {
            if !ranges.define_model.is_empty() {
                type_codes.push(ty::MODEL_EMIT.to_string());
            }
            if ranges
                .define_emits
                .as_ref()
                .is_some_and(|emits| emits.call.type_arg.is_some())
            {
                type_codes.push(ty::EMIT.to_string());
            }
        }
        if !type_codes.is_empty() {
            self.codes
                .text(format!("__typeEmits: {{}} as {},\n", type_codes.join(" & ")));
            return true;
        }

        let mut runtime_codes = Vec::new();
        if !ranges.define_model.is_empty() {
            runtime_codes.push(format!("{{}} as {}<typeof {}>", helper::NORMALIZE_EMITS, value::MODEL_EMIT));
        }
        if let Some(emits) = ranges.define_emits.as_ref().filter(|emits| emits.call.arg.is_some()) {
            let name = emits.name.as_deref().unwrap_or(value::EMIT);
            runtime_codes.push(format!("{{}} as {}<typeof {name}>", helper::NORMALIZE_EMITS));
        }
        if runtime_codes.is_empty() {
            return false;
        }
        self.codes.text("emits: ");
        self.codes.spread_merge(&runtime_codes);
        self.codes.text(",\n");
        true
    }

    fn props_option(&mut self, setup: ScriptSource<'_, ScriptSetupRanges>, has_emits_option: bool) {
        let ranges = setup.ranges;
        let compiler = self.compiler();
        let props_arg = ranges
            .define_props
            .as_ref()
            .and_then(|props| props.assignment.call.arg);
        let defaults_arg = ranges.with_defaults.and_then(|call| call.arg);
        let attrs_type = if has_emits_option {
            format!("Omit<{}, keyof {}>", ty::INHERITED_ATTRS, ty::EMIT_PROPS)
        } else {
            ty::INHERITED_ATTRS.to_string()
        };
        let has_attrs = self.has_template_type(ty::INHERITED_ATTRS);
        let has_public_props = self.generated_types.contains(ty::PUBLIC_PROPS);

        let mut type_codes = Vec::new();
        if compiler.target >= 3.5 && props_arg.is_none() {
            if has_attrs {
                type_codes.push(format!("{{}} as {attrs_type}"));
            }
            if has_public_props {
                type_codes.push(format!("{{}} as {}", ty::PUBLIC_PROPS));
            }
        }

        let mut runtime_codes = Vec::new();
        if ranges.with_defaults.is_some() || type_codes.is_empty() {
            if has_attrs {
                let to_option = self.local_types.use_type(LocalType::TypePropsToOption);
                let omit_index = self.local_types.use_type(LocalType::OmitIndexSignature);
                runtime_codes.push(format!(
                    "{{}} as {to_option}<{}<{omit_index}<{attrs_type}>, {{}}>>",
                    helper::PICK_NOT_ANY
                ));
            }
            if has_public_props && compiler.target < 3.6 {
                let to_option = self.local_types.use_type(LocalType::TypePropsToOption);
                let mut props_type = format!("{to_option}<{}>", ty::PUBLIC_PROPS);
                if defaults_arg.is_some() {
                    let with_defaults = self.local_types.use_type(LocalType::WithDefaults);
                    props_type = format!("{with_defaults}<{props_type}, typeof {}>", value::DEFAULTS);
                }
                runtime_codes.push(format!("{{}} as {props_type}"));
            }
            if let Some(arg) = props_arg {
                runtime_codes.push(setup.slice(arg.start, arg.end).to_string());
            }
        }

        if !type_codes.is_empty() {
            if compiler.target >= 3.6 && defaults_arg.is_some() {
                self.codes.text(format!("__defaults: {},\n", value::DEFAULTS));
            }
            self.codes.text("__typeProps: ");
            self.codes.spread_merge(&type_codes);
            self.codes.text(",\n");
        }
        if !runtime_codes.is_empty() {
            self.codes.text("props: ");
            self.codes.spread_merge(&runtime_codes);
            self.codes.text(",\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use crate::emit::Codes;
    use crate::options::VueCompilerOptions;
    use rustc_hash::FxHashSet;

    fn component(text: &str) -> &str {
        let start = text.find(".defineComponent({\n").unwrap_or_default();
        let end = text[start..].find("})").map_or(text.len(), |end| start + end + 2);
        &text[start..end]
    }

    #[test]
    fn test_type_props_and_emits() {
        let source = "<script setup lang=\"ts\">\ndefineProps<{ a: string }>();\nconst model = defineModel<number>();\ndefineEmits<{ go: [] }>();\n</script>";
        let text = Fixture::new(source).generate();
        assert_eq!(
            component(&text),
            ".defineComponent({\n\
             __typeEmits: {} as __VLS_ModelEmit & __VLS_Emit,\n\
             __typeProps: {} as __VLS_PublicProps,\n\
             })"
        );
    }

    #[test]
    fn test_runtime_props_and_emits() {
        let source = "<script setup>\nconst props = defineProps({ a: String });\nconst emit = defineEmits(['go']);\n</script>";
        let text = Fixture::new(source).generate();
        assert_eq!(
            component(&text),
            ".defineComponent({\n\
             emits: {} as __VLS_NormalizeEmits<typeof emit>,\n\
             props: { a: String },\n\
             })"
        );
    }

    #[test]
    fn test_with_defaults_on_older_targets() {
        let compiler = VueCompilerOptions::defaults(3.4, "vue");
        let source = "<script setup lang=\"ts\">\nconst props = withDefaults(defineProps<{ a?: string }>(), { a: 'x' });\n</script>";
        let text = Fixture::with_options(source, compiler).generate();
        assert!(text.contains("const __VLS_defaults = { a: 'x' };\n"));
        assert!(text.contains("props: {} as __VLS_WithDefaults<__VLS_TypePropsToOption<__VLS_PublicProps>, typeof __VLS_defaults>,\n"));
        assert!(text.contains("type __VLS_PrettifyLocal<T>"));
        assert!(text.contains("type __VLS_TypePropsToOption<T>"));
    }

    #[test]
    fn test_defaults_option_on_newer_targets() {
        let compiler = VueCompilerOptions::defaults(3.6, "vue");
        let source = "<script setup lang=\"ts\">\nconst props = withDefaults(defineProps<{ a?: string }>(), { a: 'x' });\n</script>";
        let text = Fixture::with_options(source, compiler).generate();
        assert!(text.contains("__defaults: __VLS_defaults,\n__typeProps: {} as __VLS_PublicProps,\n"));
        assert!(!text.contains("props: {} as"));
    }

    #[test]
    fn test_inherited_attrs_and_template_types() {
        let compiler = VueCompilerOptions {
            infer_component_dollar_el: true,
            infer_component_dollar_refs: true,
            ..VueCompilerOptions::default()
        };
        let fixture = Fixture::with_options("<script setup lang=\"ts\">\ndefineExpose({ a: 1 });\n</script>", compiler);
        let types = FxHashSet::from_iter(["__VLS_InheritedAttrs", "__VLS_TemplateRefs", "__VLS_RootEl"]);
        let text = fixture.generate_with(&types, Codes::new()).codes.to_text();
        assert_eq!(
            component(&text),
            ".defineComponent({\n\
             setup: () => __VLS_exposed,\n\
             __typeProps: {} as __VLS_InheritedAttrs,\n\
             __typeRefs: {} as __VLS_TemplateRefs,\n\
             __typeEl: {} as __VLS_RootEl,\n\
             })"
        );
    }
}
