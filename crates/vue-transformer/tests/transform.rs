//! End-to-end tests of the generated code and its source map.

use pretty_assertions::assert_eq;
use source_map::{GeneratedDiagnostic, LineIndex, SourceMapBuilder};
use vue_parser::parse;
use vue_transformer::emit::{source, Codes};
use vue_transformer::{features, transform, TransformOptions, TransformResult, VueCompilerOptions};

fn run(source: &str) -> TransformResult {
    run_with(source, VueCompilerOptions::default())
}

fn run_with(source: &str, compiler: VueCompilerOptions) -> TransformResult {
    let parsed = parse(source);
    transform(
        &parsed.document,
        &TransformOptions {
            filename: Some("src/components/Test.vue".into()),
            compiler,
        },
    )
    .unwrap()
}

/// Generated offset of `needle`, searched after `after`.
fn generated_offset(result: &TransformResult, after: &str, needle: &str) -> u32 {
    let start = result
        .ts_code
        .find(after)
        .unwrap_or_else(|| panic!("`{after}` not found in:\n{}", result.ts_code));
    let offset = result.ts_code[start..]
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found after `{after}`"));
    (start + offset) as u32
}

fn diagnostic(code: u32, start: u32, len: u32) -> GeneratedDiagnostic {
    GeneratedDiagnostic {
        code,
        start,
        end: start + len,
        message: format!("error {code}"),
    }
}

const COMPONENT: &str = r#"<script setup lang="ts">
import { ref } from 'vue';
import Child from './Child.vue';

const props = withDefaults(defineProps<{ msg: string; size?: number }>(), { size: 1 });
const emit = defineEmits<{ change: [value: number] }>();
const model = defineModel<string>();
const count = ref(0);
const list = ref([1, 2, 3]);
</script>

<template>
  <div class="root" :title="msg">
    <Child v-for="item in list" :key="item" :value="item" @change="emit('change', item)" />
    <p v-if="count > 0">{{ count }}</p>
    <p v-else>{{ props.size }}</p>
    <input v-model="model" />
  </div>
</template>

<style module>
.root { color: v-bind(color); }
</style>
"#;

#[test]
fn test_mappings_stay_inside_the_generated_text() {
    let result = run(COMPONENT);
    let len = result.ts_code.len() as u32;
    result.source_map.verify(len).unwrap();
    for mapping in result.source_map.mappings() {
        for (original, generated, segment_len) in mapping.segments() {
            assert!(generated + segment_len <= len);
            assert!(original <= COMPONENT.len() as u32);
        }
    }
}

#[test]
fn test_generated_offsets_never_decrease() {
    let result = run(COMPONENT);
    let mut previous = 0;
    for mapping in result.source_map.mappings() {
        let mut segments = mapping.segments();
        let Some((_, first, _)) = segments.next() else {
            continue;
        };
        assert!(first >= previous, "entry at {first} follows {previous}");
        previous = first;
        let mut inner = first;
        for (_, generated, _) in segments {
            assert!(generated >= inner);
            inner = generated;
        }
    }
}

#[test]
fn test_open_group_is_fatal() {
    let mut codes = Codes::new();
    codes.text("let ");
    let boundary = codes.open(source::MAIN, 0, features::VERIFICATION);
    codes.joined(boundary, "x", 0);
    let mut builder = SourceMapBuilder::new(vec![0; source::FIXED]);
    builder.extend(codes.into_segments());
    assert!(builder.finish().is_err());
}

#[test]
fn test_loop_variables_are_scoped_to_the_loop() {
    let source = r#"<script setup lang="ts">
const list = [1, 2];
</script>
<template>
  <div v-for="item in list">{{ item }}</div>
  <span>{{ item }}</span>
</template>
"#;
    let result = run(source);
    assert_eq!(result.ts_code.matches("__VLS_ctx.item").count(), 1);
    assert!(result.ts_code.contains("__VLS_ctx.list"));
    assert!(result.ts_code.contains("( item );\n"));
}

#[test]
fn test_define_props_expands_to_a_named_type() {
    let source = "<script setup lang=\"ts\">\nconst props = defineProps<{ msg: string }>();\n</script>\n";
    let result = run(source);
    assert!(result
        .ts_code
        .contains("type __VLS_Props = { msg: string };\nconst props = defineProps<__VLS_Props>();\n"));
    assert_eq!(result.ts_code.matches("{ msg: string }").count(), 1);
}

#[test]
fn test_interpolation_rewrites() {
    let source = r#"<script setup lang="ts"></script>
<template>
  {{ { foo: bar, baz } }}
  {{ foo.bar.baz }}
  {{ foo.bar[baz] }}
</template>
"#;
    let result = run(source);
    assert!(result.ts_code.contains("{ foo: __VLS_ctx.bar, baz: __VLS_ctx.baz }"));
    assert!(result.ts_code.contains("__VLS_ctx.foo.bar.baz"));
    assert!(result.ts_code.contains("__VLS_ctx.foo.bar[__VLS_ctx.baz]"));
}

#[test]
fn test_ignore_comment_covers_one_element() {
    let source = r#"<script setup lang="ts"></script>
<template>
  <!-- @vue-ignore -->
  <div :title="ignored" />
  <div :title="checked" />
</template>
"#;
    let result = run(source);
    let ignored = generated_offset(&result, "__VLS_ctx.ignored", "ignored");
    let checked = generated_offset(&result, "__VLS_ctx.checked", "checked");

    let mapped = result.map_diagnostics(&[diagnostic(2322, ignored, 7), diagnostic(2322, checked, 7)]);
    assert_eq!(mapped.len(), 1);
    let expected = source.find("checked").unwrap() as u32;
    assert_eq!(u32::from(mapped[0].span.start), expected);
}

#[test]
fn test_unused_noise_is_suppressed() {
    let mut codes = Codes::new();
    codes.text("const ");
    codes.mapped("count", source::SCRIPT_SETUP, 6, features::NO_UNUSED);
    codes.text(" = 1;\n");
    let mut builder = SourceMapBuilder::new(vec![0, 0, 0, 20]);
    builder.extend(codes.into_segments());
    let (text, map) = builder.finish().unwrap();
    assert_eq!(text, "const count = 1;\n");

    let mapped = source_map::Backmapper::new(&map).map_diagnostics(&[diagnostic(6133, 6, 5), diagnostic(2322, 6, 5)]);
    assert_eq!(mapped.len(), 1);
    assert_eq!(mapped[0].code, 2322);
    assert_eq!(u32::from(mapped[0].span.start), 26);
}

#[test]
fn test_template_expressions_map_to_their_lines() {
    let result = run(COMPONENT);
    let lines = LineIndex::new(COMPONENT);
    for (after, needle, line) in [
        ("__VLS_ctx.count", "count", 14),
        ("__VLS_ctx.list", "list", 13),
        ("__VLS_ctx.color", "color", 21),
    ] {
        let generated = generated_offset(&result, after, needle);
        let span = result
            .source_map
            .original_range(generated, generated + needle.len() as u32)
            .unwrap_or_else(|| panic!("`{needle}` is not mapped"));
        assert_eq!(lines.line_col(span.start).unwrap().line, line, "`{needle}`");
        assert_eq!(&COMPONENT[usize::from(span.start)..usize::from(span.end)], needle);
    }
}

#[test]
fn test_component_surface() {
    let result = run(COMPONENT);
    for name in ["__VLS_StyleModules", "__VLS_PublicProps"] {
        assert!(result.generated_types.contains(name), "{name} missing");
    }
    assert!(result.ts_code.contains("__typeEmits: {} as __VLS_ModelEmit & __VLS_Emit,\n"));
    assert!(result.accessed_setup_names.contains("count"));
    assert!(result.accessed_setup_names.contains("list"));
    assert!(!result.accessed_setup_names.contains("Child"));
    assert!(result.script_errors.is_empty());
}

#[test]
fn test_expect_error_swallows_errors_below_it() {
    let source = r#"<script setup lang="ts"></script>
<template>
  <!-- @vue-expect-error -->
  <div :title="fine" />
</template>
"#;
    let result = run(source);
    let fine = generated_offset(&result, "__VLS_ctx.fine", "fine");
    let swallowed = result.map_diagnostics(&[diagnostic(2322, fine, 4)]);
    assert!(swallowed.is_empty());
}

#[test]
fn test_older_target_uses_legacy_declarations() {
    let result = run_with(
        "<script setup lang=\"ts\">\nconst n = 1;\n</script>",
        VueCompilerOptions::defaults(3.2, "vue"),
    );
    assert!(!result.ts_code.contains("declare const {"));
    assert!(result.ts_code.contains("globalThis.JSX.IntrinsicElements"));
}

#[test]
fn test_script_src_reexports_the_module() {
    let result = run("<script src=\"./Test.ts\"></script>\n<template><div /></template>\n");
    insta::assert_snapshot!(result.ts_code, @r#"
    import __VLS_export from "./Test.js";
    export default {} as typeof __VLS_export;
    "#);
    assert_eq!(result.lang, "js");
}

#[test]
fn test_skip_comment_drops_only_the_next_node() {
    let source = r#"<script setup lang="ts"></script>
<template>
  <!-- @vue-skip -->
  <p :title="skipped" />
  <p :title="kept" />
</template>
"#;
    let result = run(source);
    assert!(!result.ts_code.contains("skipped"));
    assert!(result.ts_code.contains("__VLS_ctx.kept"));
}

#[test]
fn test_generic_comment_maps_into_the_comment() {
    let source = r#"<script setup lang="ts"></script>
<template>
  <!-- @vue-generic {number} -->
  <Comp />
</template>
"#;
    let result = run(source);
    let generated = generated_offset(&result, "<number>(", "number");
    let span = result
        .source_map
        .original_range(generated, generated + "number".len() as u32)
        .unwrap();
    assert_eq!(u32::from(span.start), source.find("number").unwrap() as u32);
    assert_eq!(&source[usize::from(span.start)..usize::from(span.end)], "number");
}
