//! The declarations template code reads from: `__VLS_ctx`, the component
//! and directive lookups, and the intrinsic elements.

use super::ScriptGenerator;
use crate::emit::source;
use crate::names::{helper, ty, value};

impl ScriptGenerator<'_> {
    /// The context declarations followed by the template and style code.
    /// `self_name` is the variable holding the options component, if any.
    pub(super) fn template(&mut self, self_name: Option<&str>) {
        self.setup_exposed();
        self.template_ctx(self_name);
        self.template_components();
        self.template_directives();

        if let Some(codes) = self.template_and_style.take() {
            self.codes.append(codes);
        }
    }

    fn setup_exposed(&mut self) {
        let exposed = self.options.exposed;
        if exposed.is_empty() {
            return;
        }
        self.generated_types.insert(ty::SETUP_EXPOSED);

        let mut declaration = format!(
            "type {} = import(\"{}\").ShallowUnwrapRef<{{\n",
            ty::SETUP_EXPOSED,
            self.compiler().lib
        );
        for name in exposed {
            declaration.push_str(&format!("{name}: typeof {name};\n"));
        }
        declaration.push_str("}>;\n");
        self.codes.text(declaration);
    }

    fn template_ctx(&mut self, self_name: Option<&str>) {
        let mut operands = Vec::new();
        match self_name {
            Some(name) => operands.push(format!(
                "{{}} as InstanceType<{}<typeof {name}, new () => {{}}>>",
                helper::PICK_NOT_ANY
            )),
            None => operands.push(format!(
                "{{}} as import(\"{}\").ComponentPublicInstance",
                self.compiler().lib
            )),
        }
        if self.has_template_type(ty::STYLE_MODULES) {
            operands.push(format!("{{}} as {}", ty::STYLE_MODULES));
        }

        let emit_types = self.emit_types();
        if !emit_types.is_empty() {
            let emits = emit_types.join(" & ");
            self.codes.text(format!(
                "type {} = {}<{}<{emits}>>;\n",
                ty::EMIT_PROPS,
                helper::EMITS_TO_PROPS,
                helper::NORMALIZE_EMITS
            ));
            operands.push(format!("{{}} as {{ $emit: {emits} }}"));
        }

        let mut prop_types = Vec::new();
        if let Some(setup) = self.options.script_setup {
            if let Some(props) = &setup.ranges.define_props {
                let name = props.assignment.name.as_deref().unwrap_or(value::PROPS);
                prop_types.push(format!("typeof {name}"));
            }
            if !setup.ranges.define_model.is_empty() {
                prop_types.push(ty::MODEL_PROPS.to_string());
            }
        }
        if !emit_types.is_empty() {
            prop_types.push(ty::EMIT_PROPS.to_string());
        }
        if !prop_types.is_empty() {
            let props = prop_types.join(" & ");
            operands.push(format!("{{}} as {{ $props: {props} }}"));
            operands.push(format!("{{}} as {props}"));
        }

        if self.generated_types.contains(ty::SETUP_EXPOSED) {
            operands.push(format!("{{}} as {}", ty::SETUP_EXPOSED));
        }

        self.codes.text(format!("const {} = ", value::CTX));
        self.codes.spread_merge(&operands);
        self.codes.text(";\n");
    }

    fn template_components(&mut self) {
        let mut types = Vec::new();
        if self.generated_types.contains(ty::SETUP_EXPOSED) {
            types.push(ty::SETUP_EXPOSED.to_string());
        }
        if let Some(script) = self.options.script {
            if let Some(components) = script
                .ranges
                .export_default
                .as_ref()
                .and_then(|export| export.options.as_ref())
                .and_then(|options| options.components)
            {
                self.codes.text(format!("const {} = ", value::COMPONENTS_OPTION));
                self.section(script, source::SCRIPT, components.start, components.end);
                self.codes.text(";\n");
                types.push(format!("typeof {}", value::COMPONENTS_OPTION));
            }
        }

        let compiler = self.compiler();
        let lib = &compiler.lib;
        let mut declarations = format!("type {} = {};\n", ty::LOCAL_COMPONENTS, intersection(&types));
        if compiler.target >= 3.5 {
            declarations.push_str(&format!("type {} = import(\"{lib}\").GlobalComponents;\n", ty::GLOBAL_COMPONENTS));
        } else {
            declarations.push_str(&format!(
                "type {} = import(\"{lib}\").GlobalComponents & Pick<typeof import(\"{lib}\"), \"Transition\" | \"TransitionGroup\" | \"KeepAlive\" | \"Suspense\" | \"Teleport\">;\n",
                ty::GLOBAL_COMPONENTS
            ));
        }
        if compiler.target >= 3.3 {
            declarations.push_str(&format!(
                "let {}!: import(\"{lib}/jsx-runtime\").JSX.IntrinsicElements;\n",
                value::INTRINSICS
            ));
        } else {
            declarations.push_str(&format!("let {}!: globalThis.JSX.IntrinsicElements;\n", value::INTRINSICS));
        }
        self.codes.text(declarations);
    }

    fn template_directives(&mut self) {
        let mut types = Vec::new();
        if self.generated_types.contains(ty::SETUP_EXPOSED) {
            types.push(ty::SETUP_EXPOSED.to_string());
        }
        if let Some(script) = self.options.script {
            if let Some(directives) = script
                .ranges
                .export_default
                .as_ref()
                .and_then(|export| export.options.as_ref())
                .and_then(|options| options.directives)
            {
                self.codes.text(format!("const {} = ", value::DIRECTIVES_OPTION));
                self.section(script, source::SCRIPT, directives.start, directives.end);
                self.codes.text(";\n");
                types.push(format!("{}<typeof {}>", helper::RESOLVE_DIRECTIVES, value::DIRECTIVES_OPTION));
            }
        }

        self.codes.text(format!(
            "type {} = {};\nlet {}!: {} & import(\"{}\").GlobalDirectives;\n",
            ty::LOCAL_DIRECTIVES,
            intersection(&types),
            value::DIRECTIVES,
            ty::LOCAL_DIRECTIVES,
            self.compiler().lib
        ));
    }
}

fn intersection(types: &[String]) -> String {
    if types.is_empty() {
        "{}".to_string()
    } else {
        types.join(" & ")
    }
}
