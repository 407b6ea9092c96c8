//! Assembly of the virtual TypeScript file for one document.
//!
//! The template and style code is generated first so that the script code
//! knows which setup bindings they read; the script code then wraps it and
//! the segment stream is folded into text plus a source map.

use crate::emit::{source, Codes};
use crate::error::TransformError;
use crate::options::VueCompilerOptions;
use crate::ranges::{
    collect_script_ranges, collect_script_setup_ranges, parse_script, Range, ScriptError, ScriptRanges,
    ScriptSetupRanges,
};
use crate::script::{generate_script, ScriptOptions, ScriptSource};
use crate::style::generate_style;
use crate::template::{generate_template_from, TemplateOptions};
use crate::text::{camelize, capitalize};
use camino::Utf8PathBuf;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::{
    Backmapper, ByteOffset, GeneratedDiagnostic, LineCol, LineIndex, MappedDiagnostic, SourceMap, SourceMapBuilder,
};
use vue_parser::{Block, SfcDocument};

/// Options for transformation.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// The path of the component file. Its stem names the component when
    /// neither script does.
    pub filename: Option<Utf8PathBuf>,
    /// Project-wide compiler options; per-file overrides are applied on top.
    pub compiler: VueCompilerOptions,
}

/// The result of transformation.
#[derive(Debug)]
pub struct TransformResult {
    /// The generated TypeScript code.
    pub ts_code: String,
    /// Generated offsets to document offsets.
    pub source_map: SourceMap,
    /// Language of the generated code: the script setup lang, else the
    /// script lang, else `ts`.
    pub lang: SmolStr,
    /// Optional synthetic types that were declared, by name.
    pub generated_types: FxHashSet<&'static str>,
    /// Setup bindings read by the template and styles.
    pub accessed_setup_names: IndexSet<SmolStr>,
    /// Syntax errors of the script blocks, in document offsets.
    pub script_errors: Vec<ScriptError>,
    source_lines: LineIndex,
    generated_lines: LineIndex,
}

impl TransformResult {
    /// Maps diagnostics of the type checker onto the document. Diagnostics
    /// without an accepting mapping are dropped.
    pub fn map_diagnostics(&self, diagnostics: &[GeneratedDiagnostic]) -> Vec<MappedDiagnostic> {
        let mapped = Backmapper::new(&self.source_map).map_diagnostics(diagnostics);
        tracing::debug!(
            reported = diagnostics.len(),
            kept = mapped.len(),
            "mapped diagnostics"
        );
        mapped
    }

    /// Offset in the generated code of a 0-based line and byte column.
    pub fn virtual_offset(&self, line: u32, character: u32) -> Option<u32> {
        self.generated_lines
            .offset(LineCol::new(line, character))
            .map(u32::from)
    }

    /// 0-based line and byte column of a document offset.
    pub fn source_line_col(&self, offset: u32) -> Option<LineCol> {
        self.source_lines.line_col(ByteOffset::from(offset))
    }
}

/// Transforms a parsed document into type-checkable TypeScript.
pub fn transform(document: &SfcDocument, options: &TransformOptions) -> Result<TransformResult, TransformError> {
    let _span = tracing::debug_span!("transform", filename = ?options.filename).entered();

    let compiler = options.compiler.with_local_overrides(&document.comments);
    let lang = document
        .script_setup
        .as_ref()
        .or(document.script.as_ref())
        .map_or_else(|| SmolStr::new_static("ts"), |block| block.lang.clone());

    let mut script_errors = Vec::new();
    let script_ranges = document.script.as_ref().map(|block| {
        let parsed = parse_script(&block.content, &block.lang);
        script_errors.extend(document_errors(&parsed.errors, block));
        collect_script_ranges(&parsed, &block.content, &compiler.extensions)
    });
    let setup_ranges = document.script_setup.as_ref().map(|block| {
        let parsed = parse_script(&block.content, &block.lang);
        script_errors.extend(document_errors(&parsed.errors, block));
        collect_script_setup_ranges(&parsed, &block.content, &compiler)
    });
    tracing::debug!(
        script = script_ranges.is_some(),
        script_setup = setup_ranges.is_some(),
        errors = script_errors.len(),
        "collected script ranges"
    );

    let script = document
        .script
        .as_ref()
        .zip(script_ranges.as_ref())
        .map(|(block, ranges)| ScriptSource::new(block, ranges));
    let script_setup = document
        .script_setup
        .as_ref()
        .zip(setup_ranges.as_ref())
        .map(|(block, ranges)| ScriptSource::new(block, ranges));

    let setup_consts = setup_consts(script, script_setup);
    let setup_refs: FxHashSet<SmolStr> = setup_ranges
        .iter()
        .flat_map(|ranges| &ranges.use_template_ref)
        .filter_map(|call| call.name.clone())
        .collect();

    let mut template_options = TemplateOptions::new(&compiler, &setup_consts, &setup_refs);
    template_options.inherit_attrs = inherit_attrs(script_ranges.as_ref(), setup_ranges.as_ref());
    template_options.component_name = component_name(script, setup_ranges.as_ref(), options.filename.as_ref());
    if let Some(ranges) = &setup_ranges {
        template_options.has_define_slots = ranges.define_slots.is_some();
        template_options.props_assign_name = ranges
            .define_props
            .as_ref()
            .and_then(|props| props.assignment.name.as_ref())
            .map(ToString::to_string);
        template_options.slots_assign_name = ranges
            .define_slots
            .as_ref()
            .and_then(|slots| slots.name.as_ref())
            .map(ToString::to_string);
    }

    let mut codes = Codes::new();
    let mut template_and_style_types = FxHashSet::default();
    let mut accessed_vars = IndexSet::new();
    let mut components = IndexSet::new();
    if !compiler.skip_template_codegen {
        if let Some(template) = &document.template {
            let output = generate_template_from(
                &template_options,
                &template.content,
                document.template_ast.as_ref(),
                codes,
            );
            codes = output.codes;
            template_and_style_types.extend(output.generated_types);
            accessed_vars.extend(output.accessed_vars);
            components = output.components;
        }
        if !document.styles.is_empty() {
            let output = generate_style(&template_options, &document.styles, Codes::continue_from(&codes));
            codes.append(output.codes);
            template_and_style_types.extend(output.generated_types);
            accessed_vars.extend(output.accessed_vars);
        }
    }

    let declared = declared_variables(script, script_setup);
    let mut exposed: IndexSet<SmolStr> = accessed_vars
        .into_iter()
        .filter(|name| declared.contains(name.as_str()))
        .collect();
    for component in &components {
        let camelized = camelize(component);
        let capitalized = capitalize(&camelized);
        for name in [camelized, capitalized] {
            if declared.contains(name.as_str()) {
                exposed.insert(SmolStr::new(name));
            }
        }
    }

    let script_options = ScriptOptions {
        compiler: &compiler,
        script,
        script_setup,
        template_and_style_types: &template_and_style_types,
        exposed: &exposed,
    };
    let output = generate_script(&script_options, codes);
    tracing::trace!(segments = output.codes.segments().len(), "generated segments");

    let mut builder = SourceMapBuilder::new(source_bases(document));
    builder.extend(output.codes.into_segments());
    let (ts_code, source_map) = builder.finish()?;
    source_map.verify(ts_code.len() as u32)?;
    tracing::debug!(
        generated = ts_code.len(),
        mappings = source_map.len(),
        "built source map"
    );

    let mut generated_types = template_and_style_types;
    generated_types.extend(output.generated_types);

    Ok(TransformResult {
        source_lines: LineIndex::new(&document.source),
        generated_lines: LineIndex::new(&ts_code),
        ts_code,
        source_map,
        lang,
        generated_types,
        accessed_setup_names: exposed,
        script_errors,
    })
}

/// The document offset of every source table entry.
fn source_bases(document: &SfcDocument) -> Vec<u32> {
    let base = |block: Option<&Block>| block.map_or(0, |block| block.inner_start);
    let mut bases = vec![0; source::FIXED];
    bases[source::TEMPLATE.0 as usize] = base(document.template.as_ref());
    bases[source::SCRIPT.0 as usize] = base(document.script.as_ref());
    bases[source::SCRIPT_SETUP.0 as usize] = base(document.script_setup.as_ref());
    bases.extend(document.styles.iter().map(|style| style.block.inner_start));
    bases
}

fn document_errors<'a>(errors: &'a [ScriptError], block: &'a Block) -> impl Iterator<Item = ScriptError> + 'a {
    errors.iter().map(|error| ScriptError {
        message: error.message.clone(),
        range: Range::new(
            error.range.start + block.inner_start,
            error.range.end + block.inner_start,
        ),
    })
}

/// Names the template may use as-is: component imports and destructured
/// props.
fn setup_consts(
    script: Option<ScriptSource<'_, ScriptRanges>>,
    script_setup: Option<ScriptSource<'_, ScriptSetupRanges>>,
) -> FxHashSet<SmolStr> {
    let mut consts = FxHashSet::default();
    let Some(setup) = script_setup else {
        return consts;
    };
    let content = &setup.block.content;
    consts.extend(
        setup
            .ranges
            .bindings
            .components
            .iter()
            .map(|range| SmolStr::new(range.text(content))),
    );
    if let Some(script) = script {
        let content = &script.block.content;
        consts.extend(
            script
                .ranges
                .bindings
                .components
                .iter()
                .map(|range| SmolStr::new(range.text(content))),
        );
    }
    if let Some(props) = &setup.ranges.define_props {
        consts.extend(props.destructured.iter().cloned());
        consts.extend(props.destructured_rest.clone());
    }
    consts
}

fn declared_variables<'a>(
    script: Option<ScriptSource<'a, ScriptRanges>>,
    script_setup: Option<ScriptSource<'a, ScriptSetupRanges>>,
) -> FxHashSet<&'a str> {
    let mut declared = FxHashSet::default();
    if let Some(setup) = script_setup {
        declared.extend(
            setup
                .ranges
                .bindings
                .bindings
                .iter()
                .map(|range| range.text(&setup.block.content)),
        );
    }
    if let Some(script) = script {
        declared.extend(
            script
                .ranges
                .bindings
                .bindings
                .iter()
                .map(|range| range.text(&script.block.content)),
        );
    }
    declared
}

/// `inheritAttrs` unless one of the scripts sets it to `false`.
fn inherit_attrs(script: Option<&ScriptRanges>, setup: Option<&ScriptSetupRanges>) -> bool {
    let from_setup = setup
        .and_then(|ranges| ranges.define_options.as_ref())
        .and_then(|options| options.inherit_attrs);
    let from_script = script
        .and_then(|ranges| ranges.export_default.as_ref())
        .and_then(|export| export.options.as_ref())
        .and_then(|options| options.inherit_attrs);
    from_setup.or(from_script) != Some(false)
}

/// The `name` option, the `defineOptions` name or the file stem, in
/// PascalCase.
fn component_name(
    script: Option<ScriptSource<'_, ScriptRanges>>,
    setup: Option<&ScriptSetupRanges>,
    filename: Option<&Utf8PathBuf>,
) -> String {
    let from_script = script.and_then(|script| {
        let name = script.ranges.export_default.as_ref()?.options.as_ref()?.name?;
        let inner = Range::new(name.start + 1, name.end.saturating_sub(1));
        Some(inner.text(&script.block.content))
    });
    let from_setup = || {
        setup
            .and_then(|ranges| ranges.define_options.as_ref())
            .and_then(|options| options.name.as_deref())
    };
    let from_file = || filename.and_then(|path| path.file_stem()).unwrap_or_default();

    let name = from_script.or_else(from_setup).unwrap_or_else(from_file);
    capitalize(&camelize(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> TransformResult {
        let document = vue_parser::parse(source).document;
        transform(&document, &TransformOptions::default()).unwrap()
    }

    fn name_of(source: &str, filename: Option<&str>) -> String {
        let document = vue_parser::parse(source).document;
        let compiler = VueCompilerOptions::default();
        let script_ranges = document.script.as_ref().map(|block| {
            collect_script_ranges(&parse_script(&block.content, &block.lang), &block.content, &compiler.extensions)
        });
        let setup_ranges = document.script_setup.as_ref().map(|block| {
            collect_script_setup_ranges(&parse_script(&block.content, &block.lang), &block.content, &compiler)
        });
        let script = document
            .script
            .as_ref()
            .zip(script_ranges.as_ref())
            .map(|(block, ranges)| ScriptSource::new(block, ranges));
        let filename = filename.map(Utf8PathBuf::from);
        component_name(script, setup_ranges.as_ref(), filename.as_ref())
    }

    #[test]
    fn test_lang_resolution() {
        assert_eq!(run("<script setup lang=\"tsx\"></script>").lang, "tsx");
        assert_eq!(run("<script lang=\"ts\"></script>").lang, "ts");
        assert_eq!(run("<script></script>").lang, "js");
        assert_eq!(run("<template><div /></template>").lang, "ts");
    }

    #[test]
    fn test_component_name_sources() {
        assert_eq!(name_of("<script setup></script>", Some("src/my-button.vue")), "MyButton");
        assert_eq!(
            name_of("<script setup>\ndefineOptions({ name: 'fancy-list' });\n</script>", Some("src/a.vue")),
            "FancyList"
        );
        assert_eq!(
            name_of(
                "<script>\nexport default { name: 'from-script' }\n</script>\n<script setup>\ndefineOptions({ name: 'other' });\n</script>",
                Some("a.vue")
            ),
            "FromScript"
        );
        assert_eq!(name_of("<script setup></script>", None), "");
    }

    #[test]
    fn test_inherit_attrs_prefers_define_options() {
        let compiler = VueCompilerOptions::default();
        let setup_content = "defineOptions({ inheritAttrs: true });";
        let setup = collect_script_setup_ranges(&parse_script(setup_content, "ts"), setup_content, &compiler);
        let script_content = "export default { inheritAttrs: false }";
        let script = collect_script_ranges(&parse_script(script_content, "ts"), script_content, &compiler.extensions);
        assert!(inherit_attrs(Some(&script), Some(&setup)));
        assert!(!inherit_attrs(Some(&script), None));
        assert!(inherit_attrs(None, None));
    }

    #[test]
    fn test_template_reads_are_exposed() {
        let result = run(
            "<script setup lang=\"ts\">\nconst msg = 'hi';\nconst unused = 1;\n</script>\n<template>{{ msg }}{{ other }}</template>",
        );
        assert_eq!(
            result.accessed_setup_names.iter().map(SmolStr::as_str).collect::<Vec<_>>(),
            vec!["msg"]
        );
        assert!(result.ts_code.contains("msg: typeof msg;\n"));
        assert!(result.generated_types.contains("__VLS_SetupExposed"));
    }

    #[test]
    fn test_local_overrides_apply() {
        let result = run("<!-- @target 3.2 -->\n<script setup lang=\"ts\"></script>");
        assert!(result.ts_code.contains("globalThis.JSX.IntrinsicElements"));
        let result = run("<!-- @skipTemplateCodegen true -->\n<script setup lang=\"ts\"></script>\n<template>{{ msg }}</template>");
        assert!(!result.ts_code.contains("__VLS_ctx.msg"));
    }

    #[test]
    fn test_script_errors_use_document_offsets() {
        let source = "<script setup lang=\"ts\">\nconst = ;\n</script>";
        let result = run(source);
        let inner_start = source.find('\n').unwrap() as u32;
        assert!(!result.script_errors.is_empty());
        assert!(result.script_errors.iter().all(|error| error.range.start >= inner_start));
    }

    #[test]
    fn test_diagnostics_map_back_to_the_script() {
        let source = "<script setup lang=\"ts\">\nconst a: number = 'x';\n</script>";
        let result = run(source);
        let generated = result.ts_code.find("'x'").unwrap() as u32;
        let mapped = result.map_diagnostics(&[GeneratedDiagnostic {
            code: 2322,
            start: generated,
            end: generated + 3,
            message: "Type 'string' is not assignable to type 'number'.".to_string(),
        }]);
        assert_eq!(mapped.len(), 1);
        let original = source.find("'x'").unwrap() as u32;
        assert_eq!(u32::from(mapped[0].span.start), original);
        assert_eq!(u32::from(mapped[0].span.end), original + 3);
        assert_eq!(mapped[0].source, source::SCRIPT_SETUP);
    }

    #[test]
    fn test_line_conversions() {
        let source = "<script setup lang=\"ts\">\nconst a = 1;\n</script>";
        let result = run(source);
        let offset = source.find("const").unwrap() as u32;
        assert_eq!(result.source_line_col(offset), Some(LineCol::new(1, 0)));
        assert_eq!(result.virtual_offset(0, 0), Some(0));
        assert_eq!(result.virtual_offset(10_000, 0), None);
    }

    #[test]
    fn test_source_bases_follow_the_blocks() {
        let source = "<template><div /></template>\n<script setup>\n</script>\n<style>\n.a {}\n</style>";
        let document = vue_parser::parse(source).document;
        let bases = source_bases(&document);
        assert_eq!(bases.len(), source::FIXED + 1);
        assert_eq!(bases[source::TEMPLATE.0 as usize], "<template>".len() as u32);
        assert_eq!(bases[source::SCRIPT.0 as usize], 0);
        assert_eq!(
            bases[source::style(0).0 as usize],
            source.find("<style>").unwrap() as u32 + "<style>".len() as u32
        );
    }
}
