//! Vue single-file component to TypeScript transformation for type-checking.
//!
//! This crate turns a parsed `.vue` document into one TypeScript file that
//! an external type checker can analyze, plus a source map that carries the
//! checker's diagnostics back to the component. It handles:
//! - Collecting bindings and macro calls from both script blocks
//! - Expanding `defineProps`, `defineEmits`, `defineModel` and the other
//!   compiler macros into typed declarations
//! - Rewriting the template into statements checked against the component
//!   context, with `v-if`/`v-for` narrowing and slot scopes
//! - Checking `v-bind()` references and CSS module classes of style blocks
//! - Filtering diagnostics per position (`@vue-ignore`, `@vue-expect-error`,
//!   unused-variable noise in synthetic code)
//!
//! # Example
//!
//! ```
//! use vue_parser::parse;
//! use vue_transformer::{transform, TransformOptions};
//!
//! let source = r#"
//! <script setup lang="ts">
//! const count = 0;
//! </script>
//!
//! <template>
//!   <button>{{ count }}</button>
//! </template>
//! "#;
//!
//! let parsed = parse(source);
//! let result = transform(&parsed.document, &TransformOptions::default()).unwrap();
//! assert!(result.ts_code.contains("__VLS_ctx.count"));
//! assert_eq!(result.lang, "ts");
//! ```

pub mod emit;
mod error;
pub mod features;
pub mod names;
pub mod options;
pub mod ranges;
pub mod script;
pub mod style;
pub mod template;
mod text;
mod virtual_file;

pub use error::{OptionsError, TransformError};
pub use options::{parse_local_options, CompilerOptionsBuilder, RawVueCompilerOptions, VueCompilerOptions};
pub use virtual_file::{transform, TransformOptions, TransformResult};
