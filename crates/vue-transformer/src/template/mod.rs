//! Template code generation.
//!
//! The template is rewritten into statements that the type checker can
//! validate: every element becomes a call checked against its component
//! or intrinsic type, expressions read from `__VLS_ctx`, and control flow
//! directives become `if`/`for` blocks. The trailing declarations describe
//! what the template exposes (`__VLS_Slots`, `__VLS_TemplateRefs`,
//! `__VLS_RootEl`, `__VLS_InheritedAttrs`) for the script to pick up.

mod child;
pub(crate) mod context;
mod directives;
mod element;
mod events;
pub(crate) mod interpolation;
mod property;
mod props;
mod slot_outlet;
mod v_for;
mod v_if;
mod v_slot;

use crate::emit::Codes;
use crate::features;
use crate::names::{ty, value};
use crate::options::VueCompilerOptions;
use context::TemplateContext;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use vue_parser::Fragment;

/// What the template generator needs to know about the rest of the
/// component.
#[derive(Debug)]
pub struct TemplateOptions<'a> {
    pub compiler: &'a VueCompilerOptions,
    /// Top-level constants of `<script setup>`, usable as components.
    pub setup_consts: &'a FxHashSet<SmolStr>,
    /// Variables of `<script setup>` holding `useTemplateRef` results,
    /// read through `.value`.
    pub setup_refs: &'a FxHashSet<SmolStr>,
    pub has_define_slots: bool,
    /// The variable `defineProps` is assigned to.
    pub props_assign_name: Option<String>,
    /// The variable `defineSlots` is assigned to.
    pub slots_assign_name: Option<String>,
    /// Name of the component itself, for recursive use.
    pub component_name: String,
    pub inherit_attrs: bool,
}

impl<'a> TemplateOptions<'a> {
    pub fn new(
        compiler: &'a VueCompilerOptions,
        setup_consts: &'a FxHashSet<SmolStr>,
        setup_refs: &'a FxHashSet<SmolStr>,
    ) -> Self {
        Self {
            compiler,
            setup_consts,
            setup_refs,
            has_define_slots: false,
            props_assign_name: None,
            slots_assign_name: None,
            component_name: String::new(),
            inherit_attrs: true,
        }
    }
}

/// Generated template code and what it revealed about the component.
#[derive(Debug)]
pub struct TemplateOutput {
    pub codes: Codes,
    /// Trailing type declarations that were emitted, by name.
    pub generated_types: FxHashSet<&'static str>,
    /// Context members the template reads, in first-use order.
    pub accessed_vars: IndexSet<SmolStr>,
    /// Tags resolved as components.
    pub components: IndexSet<SmolStr>,
}

/// Generates the template block. `source` is the template content the
/// fragment offsets refer to.
pub fn generate_template<'a>(
    options: &'a TemplateOptions<'a>,
    source: &'a str,
    fragment: Option<&'a Fragment>,
) -> TemplateOutput {
    generate_template_from(options, source, fragment, Codes::new())
}

/// Like [`generate_template`], continuing the combine tokens of `codes`.
pub(crate) fn generate_template_from<'a>(
    options: &'a TemplateOptions<'a>,
    source: &'a str,
    fragment: Option<&'a Fragment>,
    codes: Codes,
) -> TemplateOutput {
    let mut ctx = TemplateContext::new(options, source, codes);
    let compiler = options.compiler;

    ctx.push_scope();
    ctx.declare(options.setup_consts.iter().cloned());
    if let Some(name) = &options.props_assign_name {
        ctx.declare([name.as_str()]);
    }
    if let Some(name) = &options.slots_assign_name {
        ctx.declare([name.as_str()]);
    }
    for (enabled, name) in [
        (compiler.infer_template_dollar_slots, "$slots"),
        (compiler.infer_template_dollar_attrs, "$attrs"),
        (compiler.infer_template_dollar_refs, "$refs"),
        (compiler.infer_template_dollar_el, "$el"),
    ] {
        if enabled {
            ctx.dollar_vars.insert(name);
        }
    }

    if let Some(fragment) = fragment {
        ctx.root(&fragment.nodes);
    }
    ctx.hoist_variables();
    ctx.slots_type();
    ctx.inherited_attrs_type();
    ctx.template_refs_type();
    ctx.root_el_type();
    ctx.dollars();
    ctx.pop_scope();

    tracing::trace!(
        accessed = ctx.accessed_vars.len(),
        components = ctx.components_used.len(),
        "generated template"
    );
    TemplateOutput {
        codes: ctx.codes,
        generated_types: ctx.generated_types,
        accessed_vars: ctx.accessed_vars,
        components: ctx.components_used,
    }
}

impl TemplateContext<'_> {
    fn slots_type(&mut self) {
        if self.options.has_define_slots || (self.slots.is_empty() && self.dynamic_slots.is_empty()) {
            return;
        }
        self.generated_types.insert(ty::SLOTS);

        self.codes.text(format!("type {} = {{}}", ty::SLOTS));
        for slot in std::mem::take(&mut self.dynamic_slots) {
            self.codes.text(format!(
                "\n& {{ [K in NonNullable<typeof {}>]?: (props: typeof {}) => any }}",
                slot.exp_var, slot.props_var
            ));
        }
        for slot in std::mem::take(&mut self.slots) {
            self.codes.text("\n& { ");
            match slot.offset {
                Some(offset) if !slot.name.is_empty() => {
                    self.object_property(&slot.name, offset, features::NONE, false, false);
                }
                _ => self.codes.text("default"),
            }
            self.codes.text(format!("?: (props: typeof {}) => any }}", slot.props_var));
        }
        self.codes.text(";\n");
    }

    fn inherited_attrs_type(&mut self) {
        if self.inherited_attr_vars.is_empty() {
            return;
        }
        self.generated_types.insert(ty::INHERITED_ATTRS);

        let operands: Vec<String> = self
            .inherited_attr_vars
            .iter()
            .map(|name| format!("typeof {name}"))
            .collect();
        self.codes.text(format!(
            "type {} = Partial<{}>;\n",
            ty::INHERITED_ATTRS,
            operands.join(" & ")
        ));
    }

    fn template_refs_type(&mut self) {
        if self.template_refs.is_empty() {
            return;
        }
        self.generated_types.insert(ty::TEMPLATE_REFS);

        self.codes.text(format!("type {} = {{}}", ty::TEMPLATE_REFS));
        for (name, refs) in std::mem::take(&mut self.template_refs) {
            self.codes.text("\n& ");
            let grouped = refs.len() >= 2;
            if grouped {
                self.codes.text("(");
            }
            for (index, template_ref) in refs.into_iter().enumerate() {
                if index > 0 {
                    self.codes.text(" | ");
                }
                self.codes.text("{ ");
                self.object_property(&name, template_ref.offset, features::NONE, false, false);
                self.codes.text(format!(": {} }}", template_ref.type_exp));
            }
            if grouped {
                self.codes.text(")");
            }
        }
        self.codes.text(";\n");
    }

    fn root_el_type(&mut self) {
        if self.single_root_el_types.is_empty() || self.single_root_nodes.contains(&None) {
            return;
        }
        self.generated_types.insert(ty::ROOT_EL);

        let mut declaration = format!("type {} =", ty::ROOT_EL);
        for el_type in &self.single_root_el_types {
            declaration.push_str(&format!("\n| {el_type}"));
        }
        declaration.push_str(";\n");
        self.codes.text(declaration);
    }

    /// `__VLS_dollars`, typing the `$` members the template reads from the
    /// declarations above.
    fn dollars(&mut self) {
        if self.dollar_vars.is_empty() {
            return;
        }
        let generated = |name: &'static str, fallback: &'static str| {
            if self.generated_types.contains(name) {
                name
            } else {
                fallback
            }
        };

        let mut declaration = format!("var {}!: {{\n", value::DOLLARS);
        if self.dollar_vars.contains("$slots") {
            declaration.push_str(&format!("$slots: {};\n", generated(ty::SLOTS, "{}")));
        }
        if self.dollar_vars.contains("$attrs") {
            declaration.push_str(&format!(
                "$attrs: import(\"{}\").ComponentPublicInstance[\"$attrs\"]",
                self.options.compiler.lib
            ));
            if self.generated_types.contains(ty::INHERITED_ATTRS) {
                declaration.push_str(&format!(" & {}", ty::INHERITED_ATTRS));
            }
            declaration.push_str(";\n");
        }
        if self.dollar_vars.contains("$refs") {
            declaration.push_str(&format!("$refs: {};\n", generated(ty::TEMPLATE_REFS, "{}")));
        }
        if self.dollar_vars.contains("$el") {
            declaration.push_str(&format!("$el: {};\n", generated(ty::ROOT_EL, "any")));
        }
        declaration.push_str("};\n");
        self.codes.text(declaration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn generate(template: &str, compiler: &VueCompilerOptions) -> TemplateOutput {
        let fragment = vue_parser::parse_template(template).fragment;
        let names = FxHashSet::default();
        let options = TemplateOptions::new(compiler, &names, &names);
        generate_template(&options, template, Some(&fragment))
    }

    #[test]
    fn test_empty_template() {
        let output = generate("", &VueCompilerOptions::default());
        assert_eq!(output.codes.to_text(), "");
        assert!(output.generated_types.is_empty());
    }

    #[test]
    fn test_template_refs_type() {
        let template = "<div ref=\"box\"></div><span ref=\"box\"></span><input ref=\"field\">";
        let text = generate(template, &VueCompilerOptions::default()).codes.to_text();
        assert!(text.contains(
            "type __VLS_TemplateRefs = {}\n& ({ box: __VLS_Elements[\"div\"] } | { box: __VLS_Elements[\"span\"] })\n& { field: __VLS_Elements[\"input\"] };\n"
        ));
    }

    #[test]
    fn test_dollar_variables() {
        let compiler = VueCompilerOptions {
            infer_template_dollar_el: true,
            infer_template_dollar_refs: true,
            ..VueCompilerOptions::default()
        };
        let output = generate("<main>{{ $el }}</main>", &compiler);
        let text = output.codes.to_text();
        assert!(text.contains("( __VLS_dollars.$el );\n"));
        assert!(text.ends_with("var __VLS_dollars!: {\n$refs: {};\n$el: __VLS_RootEl;\n};\n"));
        assert!(output.generated_types.contains(ty::ROOT_EL));
    }

    #[test]
    fn test_accessed_variables() {
        let output = generate("<p :title=\"title\">{{ count + offset }}</p>", &VueCompilerOptions::default());
        assert_eq!(
            output.accessed_vars.iter().map(SmolStr::as_str).collect::<Vec<_>>(),
            vec!["title", "count", "offset"]
        );
    }
}
