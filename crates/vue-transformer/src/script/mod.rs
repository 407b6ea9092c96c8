//! Script code generation.
//!
//! The script blocks are copied through with their macros expanded, and the
//! component is rebuilt as a typed `defineComponent` call. The template and
//! style code is spliced in where the setup bindings are in scope, after the
//! context declarations it reads from.

mod component;
mod local_types;
mod setup;
mod template;

use crate::emit::{source, Codes};
use crate::features;
use crate::names::{ty, value};
use crate::options::VueCompilerOptions;
use crate::ranges::{ExportDefault, ScriptRanges, ScriptSetupRanges};
use indexmap::IndexSet;
pub use local_types::{LocalType, LocalTypes};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::SourceId;
use vue_parser::{Block, BlockAttr};

/// A script block with the ranges collected from it.
#[derive(Debug)]
pub struct ScriptSource<'a, R> {
    pub block: &'a Block,
    pub ranges: &'a R,
}

impl<R> Clone for ScriptSource<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ScriptSource<'_, R> {}

impl<'a, R> ScriptSource<'a, R> {
    pub fn new(block: &'a Block, ranges: &'a R) -> Self {
        Self { block, ranges }
    }

    fn slice(&self, start: u32, end: u32) -> &'a str {
        self.block
            .content
            .get(start as usize..end as usize)
            .unwrap_or_default()
    }

    fn len(&self) -> u32 {
        self.block.content.len() as u32
    }
}

#[derive(Debug)]
pub struct ScriptOptions<'a> {
    pub compiler: &'a VueCompilerOptions,
    pub script: Option<ScriptSource<'a, ScriptRanges>>,
    pub script_setup: Option<ScriptSource<'a, ScriptSetupRanges>>,
    /// Trailing types declared by the template and style code.
    pub template_and_style_types: &'a FxHashSet<&'static str>,
    /// Setup bindings the template and style read.
    pub exposed: &'a IndexSet<SmolStr>,
}

#[derive(Debug)]
pub struct ScriptOutput {
    pub codes: Codes,
    /// Types declared by the script code itself.
    pub generated_types: FxHashSet<&'static str>,
}

/// Generates the script code around the already generated template and
/// style code.
pub fn generate_script(options: &ScriptOptions<'_>, template_and_style: Codes) -> ScriptOutput {
    let mut generator = ScriptGenerator {
        options,
        codes: Codes::continue_from(&template_and_style),
        generated_types: FxHashSet::default(),
        local_types: LocalTypes::default(),
        template_and_style: Some(template_and_style),
    };
    generator.generate();
    let local_types = generator.local_types.generate(&options.compiler.lib);
    generator.codes.text(local_types);

    ScriptOutput {
        codes: generator.codes,
        generated_types: generator.generated_types,
    }
}

/// Where the generated setup function hands its component over.
#[derive(Debug, Clone, Copy)]
enum SetupOutput {
    Return,
    DeclareExport,
}

pub(crate) struct ScriptGenerator<'a> {
    options: &'a ScriptOptions<'a>,
    codes: Codes,
    generated_types: FxHashSet<&'static str>,
    local_types: LocalTypes,
    /// Spliced in once, by the first template section.
    template_and_style: Option<Codes>,
}

impl<'a> ScriptGenerator<'a> {
    fn compiler(&self) -> &'a VueCompilerOptions {
        self.options.compiler
    }

    fn has_template_type(&self, name: &str) -> bool {
        self.options.template_and_style_types.contains(name)
    }

    /// Verified block text, skipped when empty.
    fn section<R>(&mut self, script: ScriptSource<'_, R>, id: SourceId, start: u32, end: u32) {
        let text = script.slice(start, end);
        if !text.is_empty() {
            self.codes.mapped(text, id, start, features::VERIFICATION);
        }
    }

    fn generate(&mut self) {
        let options = self.options;
        let src = options.script.and_then(|script| match script.block.attrs.get("src") {
            Some(BlockAttr::Value { text, offset, .. }) => Some((text.as_str(), *offset)),
            _ => None,
        });

        if let Some((text, offset)) = src {
            self.script_src(text, offset);
        } else if let (Some(script), Some(setup)) = (options.script, options.script_setup) {
            self.setup_imports(setup);
            let self_name = match &script.ranges.export_default {
                Some(export_default) => {
                    self.script_with_export_default(script, export_default, value::SELF, false);
                    Some(value::SELF)
                }
                None => {
                    self.section(script, source::SCRIPT, 0, script.len());
                    self.export_default_line();
                    None
                }
            };

            self.export_declare_equal(source::SCRIPT_SETUP, setup.len(), value::EXPORT);
            if let Some(generic) = setup.block.attrs.get("generic") {
                self.setup_generic(setup, generic, self_name);
            } else {
                self.codes.text("await (async () => {\n");
                self.setup_body(setup, self_name, Some(SetupOutput::Return));
                self.codes.text("})();\n");
            }
        } else if let Some(setup) = options.script_setup {
            self.setup_imports(setup);
            if let Some(generic) = setup.block.attrs.get("generic") {
                self.export_declare_equal(source::SCRIPT_SETUP, setup.len(), value::EXPORT);
                self.setup_generic(setup, generic, None);
            } else {
                self.setup_body(setup, None, Some(SetupOutput::DeclareExport));
            }
            self.export_default_line();
        } else if let Some(script) = options.script {
            match &script.ranges.export_default {
                Some(export_default) => {
                    self.script_with_export_default(script, export_default, value::EXPORT, true);
                }
                None => {
                    self.section(script, source::SCRIPT, 0, script.len());
                    self.export_declare_equal(source::SCRIPT, script.len(), value::EXPORT);
                    self.codes.text(format!(
                        "(await import(\"{}\")).defineComponent({{}});\n",
                        self.compiler().lib
                    ));
                    self.template(Some(value::EXPORT));
                    self.export_default_line();
                }
            }
        }
    }

    /// `<script src="...">` re-exports the referenced module.
    fn script_src(&mut self, text: &str, offset: u32) {
        let path = if text.ends_with(".ts") && !text.ends_with(".d.ts") {
            format!("{}.js", &text[..text.len() - ".ts".len()])
        } else if let Some(stem) = text.strip_suffix(".tsx") {
            format!("{stem}.jsx")
        } else {
            text.to_string()
        };

        self.codes.text(format!("import {} from ", value::EXPORT));
        let boundary = self
            .codes
            .open(source::MAIN, offset, features::VERIFICATION);
        self.codes.text("\"");
        self.codes.joined(boundary, path, offset);
        self.codes.text("\"");
        self.codes.close(boundary, offset + text.len() as u32);
        self.codes.text(";\n");
        self.export_default_line();
    }

    fn export_default_line(&mut self) {
        self.codes
            .text(format!("export default {{}} as typeof {};\n", value::EXPORT));
    }

    /// `const <name> = `, with the name standing for the whole block so an
    /// unused-variable report lands nowhere.
    fn export_declare_equal(&mut self, id: SourceId, len: u32, name: &'static str) {
        self.codes.text("const ");
        self.codes.bounded(id, 0, len, features::NO_UNUSED, name);
        self.codes.text(" = ");
    }

    /// The plain script with its `export default` turned into a variable
    /// declaration, optionally followed by the template section.
    fn script_with_export_default(
        &mut self,
        script: ScriptSource<'a, ScriptRanges>,
        export_default: &ExportDefault,
        variable_name: &'static str,
        with_template: bool,
    ) {
        let (expression, is_object_literal) = match &export_default.options {
            Some(options) => (options.expression, options.is_object_literal),
            None => (export_default.expression, export_default.is_object_literal),
        };
        let wrapper = match self.compiler().options_wrapper.as_slice() {
            [left, right, ..] if is_object_literal => Some((left.clone(), right.clone())),
            _ => None,
        };

        self.section(script, source::SCRIPT, 0, expression.start);
        self.codes.text(format!("{{}} as typeof {}", value::EXPORT));
        self.section(script, source::SCRIPT, expression.end, export_default.range.end);
        self.codes.text(";\n");

        if with_template {
            self.template(Some(variable_name));
        }

        self.export_declare_equal(source::SCRIPT, script.len(), variable_name);
        match wrapper {
            Some((left, right)) => {
                self.codes.text(left);
                self.section(script, source::SCRIPT, expression.start, expression.end);
                self.codes.text(right);
            }
            None => self.section(script, source::SCRIPT, expression.start, expression.end),
        }
        self.codes.text(";\n");
        self.section(script, source::SCRIPT, export_default.range.end, script.len());
    }

    fn has_slots_type(&self) -> bool {
        self.options
            .script_setup
            .is_some_and(|setup| setup.ranges.define_slots.is_some())
            || self.has_template_type(ty::SLOTS)
    }

    /// Names of the `defineEmits` result and the model emit, as types.
    fn emit_types(&self) -> Vec<String> {
        let mut types = Vec::new();
        if let Some(setup) = self.options.script_setup {
            if let Some(emits) = &setup.ranges.define_emits {
                types.push(format!("typeof {}", emits.name.as_deref().unwrap_or(value::EMIT)));
            }
            if !setup.ranges.define_model.is_empty() {
                types.push(format!("typeof {}", value::MODEL_EMIT));
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::{collect_script_ranges, collect_script_setup_ranges, parse_script};
    use pretty_assertions::assert_eq;

    pub(super) struct Fixture {
        pub document: vue_parser::SfcDocument,
        pub script: Option<ScriptRanges>,
        pub script_setup: Option<ScriptSetupRanges>,
        pub compiler: VueCompilerOptions,
    }

    impl Fixture {
        pub fn new(source: &str) -> Self {
            Self::with_options(source, VueCompilerOptions::default())
        }

        pub fn with_options(source: &str, compiler: VueCompilerOptions) -> Self {
            let document = vue_parser::parse(source).document;
            let script = document.script.as_ref().map(|block| {
                let parsed = parse_script(&block.content, &block.lang);
                collect_script_ranges(&parsed, &block.content, &compiler.extensions)
            });
            let script_setup = document.script_setup.as_ref().map(|block| {
                let parsed = parse_script(&block.content, &block.lang);
                collect_script_setup_ranges(&parsed, &block.content, &compiler)
            });
            Self {
                document,
                script,
                script_setup,
                compiler,
            }
        }

        pub fn generate_with(&self, types: &FxHashSet<&'static str>, template: Codes) -> ScriptOutput {
            let exposed = IndexSet::new();
            let options = ScriptOptions {
                compiler: &self.compiler,
                script: self
                    .document
                    .script
                    .as_ref()
                    .zip(self.script.as_ref())
                    .map(|(block, ranges)| ScriptSource::new(block, ranges)),
                script_setup: self
                    .document
                    .script_setup
                    .as_ref()
                    .zip(self.script_setup.as_ref())
                    .map(|(block, ranges)| ScriptSource::new(block, ranges)),
                template_and_style_types: types,
                exposed: &exposed,
            };
            generate_script(&options, template)
        }

        pub fn generate(&self) -> String {
            self.generate_with(&FxHashSet::default(), Codes::new())
                .codes
                .to_text()
        }
    }

    #[test]
    fn test_script_src() {
        let text = Fixture::new("<script src=\"./comp.ts\"></script>").generate();
        assert_eq!(
            text,
            "import __VLS_export from \"./comp.js\";\nexport default {} as typeof __VLS_export;\n"
        );
    }

    #[test]
    fn test_script_src_keeps_declaration_files() {
        let text = Fixture::new("<script src=\"./types.d.ts\"></script>").generate();
        assert!(text.starts_with("import __VLS_export from \"./types.d.ts\";\n"));
        let text = Fixture::new("<script src=\"./comp.tsx\"></script>").generate();
        assert!(text.starts_with("import __VLS_export from \"./comp.jsx\";\n"));
    }

    #[test]
    fn test_script_without_export_default() {
        let text = Fixture::new("<script>\nconst a = 1;\n</script>").generate();
        assert!(text.starts_with("\nconst a = 1;\nconst __VLS_export = (await import(\"vue\")).defineComponent({});\n"));
        assert!(text.contains("const __VLS_ctx = {} as InstanceType<__VLS_PickNotAny<typeof __VLS_export, new () => {}>>;\n"));
        assert!(text.ends_with("export default {} as typeof __VLS_export;\n"));
    }

    #[test]
    fn test_script_export_default_is_wrapped() {
        let text = Fixture::new("<script>\nexport default { name: 'Foo' }\n</script>").generate();
        assert!(text.starts_with("\nexport default {} as typeof __VLS_export;\n"));
        assert!(text.contains("const __VLS_export = (await import('vue')).defineComponent({ name: 'Foo' });\n"));
    }

    #[test]
    fn test_both_scripts_share_the_export() {
        let source = "<script lang=\"ts\">\nexport default { inheritAttrs: false }\n</script>\n\
                      <script setup lang=\"ts\">\nimport { ref } from 'vue';\nconst n = ref(1);\n</script>";
        let text = Fixture::new(source).generate();
        assert!(text.starts_with("\nimport { ref } from 'vue';\n"));
        assert!(text.contains("export default {} as typeof __VLS_export;\nconst __VLS_self = (await import('vue')).defineComponent({ inheritAttrs: false });\n"));
        assert!(text.contains("const __VLS_export = await (async () => {\n"));
        assert!(text.contains("{} as InstanceType<__VLS_PickNotAny<typeof __VLS_self, new () => {}>>"));
        assert!(text.contains("return (await import(\"vue\")).defineComponent({\n})"));
        assert!(text.ends_with("})();\n"));
    }

    #[test]
    fn test_template_codes_are_spliced_once() {
        let fixture = Fixture::new("<script setup lang=\"ts\">\nconst a = 1;\n</script>");
        let mut template = Codes::new();
        template.text("/* template */\n");
        let text = fixture
            .generate_with(&FxHashSet::default(), template)
            .codes
            .to_text();
        assert_eq!(text.matches("/* template */").count(), 1);
        let template_at = text.find("/* template */").unwrap();
        assert!(text.find("const __VLS_ctx").unwrap() < template_at);
        assert!(template_at < text.find("const __VLS_export = ").unwrap());
    }
}
