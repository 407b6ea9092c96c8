//! `<script setup>`: the body with its macros expanded, the model and props
//! types, and the generic wrapper.

use super::{LocalType, ScriptGenerator, ScriptSource, SetupOutput};
use crate::emit::source;
use crate::features;
use crate::names::{ty, value};
use crate::ranges::{Range, ScriptSetupRanges};
use crate::text::{camelize, unquote};
use vue_parser::BlockAttr;

type SetupSource<'s> = ScriptSource<'s, ScriptSetupRanges>;

/// A piece of replacement code.
#[derive(Debug)]
enum Piece {
    Text(String),
    /// Verified block text.
    Section(Range),
    /// Text reported against a block range.
    Bounded(Range, &'static str),
}

impl From<&str> for Piece {
    fn from(text: &str) -> Self {
        Piece::Text(text.to_string())
    }
}

impl From<String> for Piece {
    fn from(text: String) -> Self {
        Piece::Text(text)
    }
}

/// Replaces `start..end` of the block; an empty range inserts.
#[derive(Debug)]
struct Edit {
    start: u32,
    end: u32,
    pieces: Vec<Piece>,
}

/// Edits applied to a block range while copying it through.
#[derive(Debug, Default)]
struct BlockTransform {
    edits: Vec<Edit>,
}

impl BlockTransform {
    fn insert(&mut self, offset: u32, pieces: Vec<Piece>) {
        self.replace(offset, offset, pieces);
    }

    fn replace(&mut self, start: u32, end: u32, pieces: Vec<Piece>) {
        self.edits.push(Edit { start, end, pieces });
    }
}

/// Edits turning a macro call into a typed variable. A type argument moves
/// into `type <type_name> = ...` ahead of the statement, and a call whose
/// result is not assigned to an identifier is assigned to `default_name`.
fn define_with_type(
    transform: &mut BlockTransform,
    statement: Range,
    call: Range,
    type_arg: Option<Range>,
    assigned: bool,
    default_name: &'static str,
    type_name: &'static str,
) {
    if let Some(type_arg) = type_arg {
        transform.insert(
            statement.start,
            vec![format!("type {type_name} = ").into(), Piece::Section(type_arg), ";\n".into()],
        );
        transform.replace(type_arg.start, type_arg.end, vec![type_name.into()]);
    }
    if assigned {
        return;
    }
    let declare = format!("const {default_name} = ");
    if statement == call {
        transform.insert(call.start, vec![declare.into()]);
    } else if let Some(type_arg) = type_arg {
        transform.replace(
            statement.start,
            type_arg.start,
            vec![declare.into(), Piece::Section(Range::new(call.start, type_arg.start))],
        );
        transform.replace(
            type_arg.end,
            call.end,
            vec![
                Piece::Section(Range::new(type_arg.end, call.end)),
                ";\n".into(),
                Piece::Section(Range::new(statement.start, call.start)),
                default_name.into(),
            ],
        );
    } else {
        transform.replace(
            statement.start,
            call.end,
            vec![
                declare.into(),
                Piece::Section(call),
                ";\n".into(),
                Piece::Section(Range::new(statement.start, call.start)),
                default_name.into(),
            ],
        );
    }
}

impl ScriptGenerator<'_> {
    /// The import section, copied first so imports stay at the top level.
    pub(super) fn setup_imports(&mut self, setup: SetupSource<'_>) {
        let end = imports_end(setup.ranges);
        self.section(setup, source::SCRIPT_SETUP, 0, end);
    }

    /// Wraps the setup body in a generic function whose parameters and
    /// return type describe the component.
    pub(super) fn setup_generic(&mut self, setup: SetupSource<'_>, generic: &BlockAttr, self_name: Option<&str>) {
        let ranges = setup.ranges;
        let compiler = self.compiler();
        let lib = compiler.lib.as_str();

        self.codes.text("(");
        if let BlockAttr::Value { text, offset, .. } = generic {
            self.codes.text("<");
            self.codes
                .mapped(text.as_str(), source::MAIN, *offset, features::VERIFICATION);
            if !text.ends_with(',') {
                self.codes.text(",");
            }
            self.codes.text(">");
        }
        let prettify = self.local_types.use_type(LocalType::PrettifyLocal);
        let awaited = format!("NonNullable<Awaited<typeof {}>>", value::SETUP);
        self.codes.text(format!(
            "(\n  {}: {awaited}[\"props\"],\n  {}?: {prettify}<Pick<{awaited}, \"attrs\" | \"emit\" | \"slots\">>,\n  {}?: {awaited}[\"expose\"],\n  {} = (async () => {{\n",
            value::PROPS,
            value::CTX,
            value::EXPOSED,
            value::SETUP,
        ));

        self.setup_body(setup, self_name, None);

        let mut prop_types = Vec::new();
        if self.generated_types.contains(ty::PUBLIC_PROPS) {
            prop_types.push(ty::PUBLIC_PROPS.to_string());
        }
        if let Some(arg) = ranges.define_props.as_ref().and_then(|props| props.assignment.call.arg) {
            self.codes.text(format!("const {} = ", value::PROPS_OPTION));
            self.section(setup, source::SCRIPT_SETUP, arg.start, arg.end);
            self.codes.text(";\n");
            let extract = if compiler.target >= 3.3 {
                "ExtractPublicPropTypes"
            } else {
                "ExtractPropTypes"
            };
            prop_types.push(format!("import(\"{lib}\").{extract}<typeof {}>", value::PROPS_OPTION));
        }
        if ranges.define_emits.is_some() || !ranges.define_model.is_empty() {
            prop_types.push(ty::EMIT_PROPS.to_string());
        }
        if self.has_template_type(ty::INHERITED_ATTRS) {
            prop_types.push(ty::INHERITED_ATTRS.to_string());
        }
        let emit_types = self.emit_types();

        let mut tail = String::from("return {} as {\n  props: ");
        if compiler.target >= 3.4 {
            tail.push_str(&format!("import(\"{lib}\").PublicProps"));
        } else {
            let types: Vec<String> = ["VNodeProps", "AllowedComponentProps", "ComponentCustomProps"]
                .iter()
                .map(|name| format!("import(\"{lib}\").{name}"))
                .collect();
            tail.push_str(&types.join(" & "));
        }
        if !prop_types.is_empty() {
            tail.push_str(&format!(" & {prettify}<{}>", prop_types.join(" & ")));
        }
        tail.push_str(" & (typeof globalThis extends { __VLS_PROPS_FALLBACK: infer P } ? P : {});\n");

        tail.push_str("  expose: (exposed: ");
        if ranges.define_expose.is_some() {
            tail.push_str(&format!("import(\"{lib}\").ShallowUnwrapRef<typeof {}>", value::EXPOSED));
        } else {
            tail.push_str("{}");
        }
        if compiler.infer_component_dollar_refs && self.has_template_type(ty::TEMPLATE_REFS) {
            tail.push_str(&format!(" & {{ $refs: {} }}", ty::TEMPLATE_REFS));
        }
        if compiler.infer_component_dollar_el && self.has_template_type(ty::ROOT_EL) {
            tail.push_str(&format!(" & {{ $el: {} }}", ty::ROOT_EL));
        }
        tail.push_str(") => void;\n  attrs: any;\n");
        tail.push_str(&format!(
            "  slots: {};\n",
            if self.has_slots_type() { ty::SLOTS } else { "{}" }
        ));
        tail.push_str(&format!(
            "  emit: {};\n",
            if emit_types.is_empty() {
                "{}".to_string()
            } else {
                emit_types.join(" & ")
            }
        ));
        tail.push_str("};\n})(),\n");
        tail.push_str(&format!(
            ") => ({{}} as import(\"{lib}\").VNode & {{ __ctx?: Awaited<typeof {}> }}));\n",
            value::SETUP
        ));
        self.codes.text(tail);
    }

    /// The body after the imports, then the generated declarations, the
    /// template section and, with `output`, the component.
    pub(super) fn setup_body(&mut self, setup: SetupSource<'_>, self_name: Option<&str>, output: Option<SetupOutput>) {
        let transform = self.macro_edits(setup);
        self.apply(setup, imports_end(setup.ranges), setup.len(), transform);
        if !self.codes.at_line_start() {
            self.codes.text("\n");
        }

        self.macros();
        self.models(setup);
        self.public_props(setup);
        self.template(self_name);

        let Some(output) = output else {
            return;
        };
        if self.has_slots_type() {
            self.codes.text(format!("const {} = ", value::BASE));
            self.component(setup);
            self.codes.text(";\n");
            self.setup_output(setup, output);
            let with_slots = self.local_types.use_type(LocalType::WithSlots);
            self.codes.text(format!(
                "{{}} as {with_slots}<typeof {}, {}>;\n",
                value::BASE,
                ty::SLOTS
            ));
        } else {
            self.setup_output(setup, output);
            self.component(setup);
            self.codes.text(";\n");
        }
    }

    fn setup_output(&mut self, setup: SetupSource<'_>, output: SetupOutput) {
        match output {
            SetupOutput::Return => self.codes.text("return "),
            SetupOutput::DeclareExport => {
                self.export_declare_equal(source::SCRIPT_SETUP, setup.len(), value::EXPORT);
            }
        }
    }

    fn macro_edits(&self, setup: SetupSource<'_>) -> BlockTransform {
        let ranges = setup.ranges;
        let compiler = self.compiler();
        let mut transform = BlockTransform::default();

        if let Some(props) = &ranges.define_props {
            let assignment = &props.assignment;
            let call = ranges.with_defaults.map_or(assignment.call.call, |with_defaults| with_defaults.call);
            define_with_type(
                &mut transform,
                assignment.statement,
                call,
                assignment.call.type_arg,
                assignment.name.is_some(),
                value::PROPS,
                ty::PROPS,
            );
        }
        if let Some(emits) = &ranges.define_emits {
            define_with_type(
                &mut transform,
                emits.statement,
                emits.call.call,
                emits.call.type_arg,
                emits.name.is_some(),
                value::EMIT,
                ty::EMIT,
            );
        }
        if let Some(slots) = &ranges.define_slots {
            define_with_type(
                &mut transform,
                slots.statement,
                slots.call.call,
                slots.call.type_arg,
                slots.name.is_some(),
                value::SLOTS,
                ty::SLOTS,
            );
        }

        if let Some(expose) = &ranges.define_expose {
            if let Some(type_arg) = expose.type_arg {
                transform.insert(
                    expose.call.start,
                    vec![format!("let {}!: ", value::EXPOSED).into(), Piece::Section(type_arg), ";\n".into()],
                );
                transform.replace(type_arg.start, type_arg.end, vec![format!("typeof {}", value::EXPOSED).into()]);
            } else if let Some(arg) = expose.arg {
                transform.insert(
                    expose.call.start,
                    vec![format!("const {} = ", value::EXPOSED).into(), Piece::Section(arg), ";\n".into()],
                );
                transform.replace(arg.start, arg.end, vec![value::EXPOSED.into()]);
            } else {
                transform.insert(expose.call.start, vec![format!("const {} = {{}};\n", value::EXPOSED).into()]);
            }
        }

        if compiler.infer_template_dollar_attrs {
            for call in &ranges.use_attrs {
                transform.insert(call.call.start, vec!["(".into()]);
                transform.insert(call.call.end, vec![format!(" as typeof {}.$attrs)", value::DOLLARS).into()]);
            }
        }
        for call in &ranges.use_css_module {
            let modules = if self.has_template_type(ty::STYLE_MODULES) {
                ty::STYLE_MODULES
            } else {
                "{}"
            };
            transform.insert(call.call.start, vec!["(".into()]);
            match call.arg {
                Some(arg) => {
                    transform.insert(
                        call.call.end,
                        vec![
                            format!(" as Omit<{modules}, \"$style\">[").into(),
                            Piece::Section(arg),
                            "])".into(),
                        ],
                    );
                    transform.replace(arg.start, arg.end, vec!["{} as any".into()]);
                }
                None => transform.insert(
                    call.call.end,
                    vec![
                        format!(" as {modules}[").into(),
                        Piece::Bounded(call.exp, "\"$style\""),
                        "])".into(),
                    ],
                ),
            }
        }
        if compiler.infer_template_dollar_slots {
            for call in &ranges.use_slots {
                transform.insert(call.call.start, vec!["(".into()]);
                transform.insert(call.call.end, vec![format!(" as typeof {}.$slots)", value::DOLLARS).into()]);
            }
        }
        let has_template_refs = self.has_template_type(ty::TEMPLATE_REFS);
        for use_ref in &ranges.use_template_ref {
            let call = &use_ref.call;
            if call.type_arg.is_some() {
                continue;
            }
            let mut cast = vec![format!(" as Readonly<import(\"{}\").ShallowRef<", compiler.lib).into()];
            match call.arg.filter(|_| has_template_refs) {
                Some(arg) => {
                    cast.push(format!("{}[", ty::TEMPLATE_REFS).into());
                    cast.push(Piece::Section(arg));
                    cast.push("]".into());
                    transform.replace(arg.start, arg.end, vec!["{} as any".into()]);
                }
                None => cast.push("unknown".into()),
            }
            cast.push(" | null>>)".into());
            transform.insert(call.call.start, vec!["(".into()]);
            transform.insert(call.call.end, cast);
        }
        transform
    }

    /// Copies `start..end` of the block with the edits applied in source
    /// order; edits at the same offset keep the order they were added in.
    fn apply(&mut self, setup: SetupSource<'_>, start: u32, end: u32, mut transform: BlockTransform) {
        transform.edits.sort_by_key(|edit| edit.start);
        let mut offset = start;
        for edit in transform.edits {
            if edit.start > offset {
                self.section(setup, source::SCRIPT_SETUP, offset, edit.start);
            }
            for piece in edit.pieces {
                match piece {
                    Piece::Text(text) => self.codes.text(text),
                    Piece::Section(range) => self.section(setup, source::SCRIPT_SETUP, range.start, range.end),
                    Piece::Bounded(range, text) => {
                        self.codes
                            .bounded(source::SCRIPT_SETUP, range.start, range.end, features::VERIFICATION, text);
                    }
                }
            }
            offset = offset.max(edit.end);
        }
        if end > offset {
            self.section(setup, source::SCRIPT_SETUP, offset, end);
        }
    }

    /// Declares the macros as values of the library, except names the
    /// component itself exposes.
    fn macros(&mut self) {
        let compiler = self.compiler();
        if compiler.target < 3.3 {
            return;
        }
        let mut declaration = String::from("// @ts-ignore\ndeclare const { ");
        for name in compiler.macros.keys() {
            if !self.options.exposed.contains(name) {
                declaration.push_str(&format!("{name}, "));
            }
        }
        declaration.push_str(&format!("}}: typeof import(\"{}\");\n", compiler.lib));
        self.codes.text(declaration);
    }

    fn models(&mut self, setup: SetupSource<'_>) {
        let models = &setup.ranges.define_model;
        if models.is_empty() {
            return;
        }
        let text = |range: Range| setup.slice(range.start, range.end);

        let mut defaults = String::new();
        let mut props = String::new();
        let mut emits = String::new();
        for model in models {
            let prop_name = model
                .name
                .map_or_else(|| "modelValue".to_string(), |name| camelize(unquote(text(name))));

            let model_type = if let Some(type_arg) = model.type_arg {
                text(type_arg).to_string()
            } else if let (Some(_), Some(local_name)) = (model.runtime_type, model.local_name) {
                format!("typeof {}[\"value\"]", text(local_name))
            } else if model.default_value.is_some() {
                format!("typeof {}[\"{prop_name}\"]", value::DEFAULT_MODELS)
            } else {
                "any".to_string()
            };

            if let Some(default_value) = model.default_value {
                defaults.push_str(&format!("\"{prop_name}\": {},\n", text(default_value)));
            }

            if let Some(comments) = model.comments {
                props.push_str(text(comments));
                props.push('\n');
            }
            match model.name {
                Some(name) => props.push_str(&camelize(text(name))),
                None => props.push_str(&prop_name),
            }
            props.push_str(if model.required { ": " } else { "?: " });
            props.push_str(&model_type);
            props.push_str(";\n");
            if let Some(modifier_type) = model.modifier_type {
                let modifier_name = if prop_name == "modelValue" { "model" } else { prop_name.as_str() };
                props.push_str(&format!(
                    "\"{modifier_name}Modifiers\"?: Partial<Record<{}, true>>;\n",
                    text(modifier_type)
                ));
            }

            emits.push_str(&format!("\"update:{prop_name}\": [value: {model_type}"));
            if !model.required && model.default_value.is_none() {
                emits.push_str(" | undefined");
            }
            emits.push_str("];\n");
        }

        let mut declarations = String::new();
        if !defaults.is_empty() {
            declarations.push_str(&format!("const {} = {{\n{defaults}}};\n", value::DEFAULT_MODELS));
        }
        declarations.push_str(&format!("type {} = {{\n{props}}};\n", ty::MODEL_PROPS));
        declarations.push_str(&format!("type {} = {{\n{emits}}};\n", ty::MODEL_EMIT));
        declarations.push_str(&format!(
            "const {} = defineEmits<{}>();\n",
            value::MODEL_EMIT,
            ty::MODEL_EMIT
        ));
        self.codes.text(declarations);
    }

    fn public_props(&mut self, setup: SetupSource<'_>) {
        let ranges = setup.ranges;
        let has_type_arg = ranges
            .define_props
            .as_ref()
            .is_some_and(|props| props.assignment.call.type_arg.is_some());

        if let Some(arg) = ranges.with_defaults.and_then(|call| call.arg).filter(|_| has_type_arg) {
            self.codes.text(format!("const {} = ", value::DEFAULTS));
            self.section(setup, source::SCRIPT_SETUP, arg.start, arg.end);
            self.codes.text(";\n");
        }

        let mut prop_types = Vec::new();
        if has_type_arg {
            prop_types.push(ty::PROPS);
        }
        if !ranges.define_model.is_empty() {
            prop_types.push(ty::MODEL_PROPS);
        }
        if !prop_types.is_empty() {
            self.codes
                .text(format!("type {} = {};\n", ty::PUBLIC_PROPS, prop_types.join(" & ")));
            self.generated_types.insert(ty::PUBLIC_PROPS);
        }
    }
}

fn imports_end(ranges: &ScriptSetupRanges) -> u32 {
    ranges
        .leading_comment_end_offset
        .max(ranges.import_section_end_offset)
}
