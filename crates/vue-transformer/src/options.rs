//! Compiler options: defaults, project settings and per-file overrides.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, project
//! options, per-file `<!-- @key value -->` comments.

use crate::error::OptionsError;
use crate::text::{camelize, hyphenate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Version used when the project does not say.
pub const DEFAULT_TARGET: f64 = 99.0;

/// Which elements bind `v-model` to a property other than `modelValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelPropTarget {
    /// Every element with the tag.
    Always(bool),
    /// Elements whose static attributes all match.
    Attrs(IndexMap<SmolStr, SmolStr>),
    /// Elements matching any of the attribute sets.
    AnyOf(Vec<IndexMap<SmolStr, SmolStr>>),
}

impl ModelPropTarget {
    /// Returns true when an element with the given static attribute lookup matches.
    pub fn matches<'a>(&self, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        let all = |attrs: &IndexMap<SmolStr, SmolStr>| {
            attrs.iter().all(|(name, value)| attr(name) == Some(value.as_str()))
        };
        match self {
            ModelPropTarget::Always(enabled) => *enabled,
            ModelPropTarget::Attrs(attrs) => all(attrs),
            ModelPropTarget::AnyOf(sets) => sets.iter().any(|set| all(set)),
        }
    }
}

/// Model property name to tag to matching rule.
pub type ModelPropNames = IndexMap<SmolStr, IndexMap<SmolStr, ModelPropTarget>>;

/// Fully resolved options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VueCompilerOptions {
    /// Vue version as `major.minor`.
    pub target: f64,
    /// Module the generated code imports Vue types from.
    pub lib: String,
    /// File extensions treated as single-file components.
    pub extensions: Vec<String>,
    pub strict_v_model: bool,
    pub strict_css_modules: bool,
    pub check_unknown_props: bool,
    pub check_unknown_events: bool,
    pub check_unknown_directives: bool,
    pub check_unknown_components: bool,
    pub infer_component_dollar_el: bool,
    pub infer_component_dollar_refs: bool,
    pub infer_template_dollar_attrs: bool,
    pub infer_template_dollar_el: bool,
    pub infer_template_dollar_refs: bool,
    pub infer_template_dollar_slots: bool,
    pub skip_template_codegen: bool,
    pub fallthrough_attributes: bool,
    /// Hyphenated names of components that pass attributes to their child.
    pub fallthrough_component_names: Vec<String>,
    /// Glob patterns of attributes that are never props.
    pub data_attributes: Vec<String>,
    /// Glob patterns of attributes that keep their hyphenated name.
    pub html_attributes: Vec<String>,
    /// Text before and after an options object in `export default`.
    pub options_wrapper: Vec<String>,
    /// Macro name to accepted callee names.
    pub macros: IndexMap<SmolStr, Vec<SmolStr>>,
    /// Composable name to accepted callee names.
    pub composables: IndexMap<SmolStr, Vec<SmolStr>>,
    pub experimental_model_prop_name: ModelPropNames,
}

impl Default for VueCompilerOptions {
    fn default() -> Self {
        Self::defaults(DEFAULT_TARGET, "vue")
    }
}

const DEFAULT_MACROS: &[(&str, &[&str])] = &[
    ("defineProps", &["defineProps"]),
    ("defineSlots", &["defineSlots"]),
    ("defineEmits", &["defineEmits"]),
    ("defineExpose", &["defineExpose"]),
    ("defineModel", &["defineModel"]),
    ("defineOptions", &["defineOptions"]),
    ("withDefaults", &["withDefaults"]),
];

const DEFAULT_COMPOSABLES: &[(&str, &[&str])] = &[
    ("useAttrs", &["useAttrs"]),
    ("useCssModule", &["useCssModule"]),
    ("useSlots", &["useSlots"]),
    ("useTemplateRef", &["useTemplateRef", "templateRef"]),
];

fn names(entries: &[(&str, &[&str])]) -> IndexMap<SmolStr, Vec<SmolStr>> {
    entries
        .iter()
        .map(|(key, aliases)| (SmolStr::new(key), aliases.iter().map(|alias| SmolStr::new(alias)).collect()))
        .collect()
}

fn default_model_prop_names() -> ModelPropNames {
    let mut value = IndexMap::new();
    value.insert(
        SmolStr::new_static("input"),
        ModelPropTarget::Attrs(IndexMap::from([(SmolStr::new_static("type"), SmolStr::new_static("text"))])),
    );
    value.insert(SmolStr::new_static("textarea"), ModelPropTarget::Always(true));
    value.insert(SmolStr::new_static("select"), ModelPropTarget::Always(true));

    IndexMap::from([
        (
            SmolStr::default(),
            IndexMap::from([(SmolStr::new_static("input"), ModelPropTarget::Always(true))]),
        ),
        (SmolStr::new_static("value"), value),
    ])
}

impl VueCompilerOptions {
    /// Built-in defaults for a Vue version and library name.
    pub fn defaults(target: f64, lib: &str) -> Self {
        let options_wrapper = if target >= 2.7 {
            vec![format!("(await import('{lib}')).defineComponent("), ")".to_string()]
        } else {
            vec![format!("(await import('{lib}')).default.extend("), ")".to_string()]
        };
        Self {
            target,
            lib: lib.to_string(),
            extensions: vec![".vue".to_string()],
            strict_v_model: false,
            strict_css_modules: false,
            check_unknown_props: false,
            check_unknown_events: false,
            check_unknown_directives: false,
            check_unknown_components: false,
            infer_component_dollar_el: false,
            infer_component_dollar_refs: false,
            infer_template_dollar_attrs: false,
            infer_template_dollar_el: false,
            infer_template_dollar_refs: false,
            infer_template_dollar_slots: false,
            skip_template_codegen: false,
            fallthrough_attributes: false,
            fallthrough_component_names: ["Transition", "KeepAlive", "Teleport", "Suspense"]
                .iter()
                .map(|name| hyphenate(name))
                .collect(),
            data_attributes: Vec::new(),
            html_attributes: vec!["aria-*".to_string()],
            options_wrapper,
            macros: names(DEFAULT_MACROS),
            composables: names(DEFAULT_COMPOSABLES),
            experimental_model_prop_name: default_model_prop_names(),
        }
    }

    /// Applies per-file overrides found in top-level comments.
    pub fn with_local_overrides(&self, comments: &[String]) -> Self {
        match parse_local_options(comments) {
            Some(local) => {
                let mut builder = CompilerOptionsBuilder::new();
                builder.add(local);
                builder.build_over(self)
            }
            None => self.clone(),
        }
    }

    /// Returns true when the target is at least `version`.
    #[inline]
    pub fn targets(&self, version: f64) -> bool {
        self.target >= version
    }
}

/// A `target` value: a version number or `"auto"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTarget {
    Version(f64),
    Named(String),
}

macro_rules! raw_options {
    ($($field:ident: $ty:ty,)*) => {
        /// Options as written by the user; every field optional.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct RawVueCompilerOptions {
            pub target: Option<RawTarget>,
            /// Shorthand filling every unset strictness flag.
            pub strict_templates: Option<bool>,
            $(pub $field: Option<$ty>,)*
        }

        impl RawVueCompilerOptions {
            /// Overwrites fields set in `other`.
            fn merge(&mut self, other: RawVueCompilerOptions) {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            }
        }

        impl CompilerOptionsBuilder {
            /// Resolves the accumulated options over `defaults`.
            pub fn build_over(&self, defaults: &VueCompilerOptions) -> VueCompilerOptions {
                let resolved = &self.resolved;
                let mut options = VueCompilerOptions {
                    target: self.target.unwrap_or(defaults.target),
                    $($field: resolved.$field.clone().unwrap_or_else(|| defaults.$field.clone()),)*
                };
                options.macros = defaults.macros.clone();
                options.macros.extend(resolved.macros.clone().unwrap_or_default());
                options.composables = defaults.composables.clone();
                options.composables.extend(resolved.composables.clone().unwrap_or_default());
                options.fallthrough_component_names = defaults
                    .fallthrough_component_names
                    .iter()
                    .chain(resolved.fallthrough_component_names.iter().flatten())
                    .map(|name| hyphenate(name))
                    .collect();
                options.experimental_model_prop_name = resolved
                    .experimental_model_prop_name
                    .as_ref()
                    .unwrap_or(&defaults.experimental_model_prop_name)
                    .iter()
                    .map(|(key, value)| (SmolStr::new(camelize(key)), value.clone()))
                    .collect();
                options
            }
        }
    };
}

raw_options! {
    lib: String,
    extensions: Vec<String>,
    strict_v_model: bool,
    strict_css_modules: bool,
    check_unknown_props: bool,
    check_unknown_events: bool,
    check_unknown_directives: bool,
    check_unknown_components: bool,
    infer_component_dollar_el: bool,
    infer_component_dollar_refs: bool,
    infer_template_dollar_attrs: bool,
    infer_template_dollar_el: bool,
    infer_template_dollar_refs: bool,
    infer_template_dollar_slots: bool,
    skip_template_codegen: bool,
    fallthrough_attributes: bool,
    fallthrough_component_names: Vec<String>,
    data_attributes: Vec<String>,
    html_attributes: Vec<String>,
    options_wrapper: Vec<String>,
    macros: IndexMap<SmolStr, Vec<SmolStr>>,
    composables: IndexMap<SmolStr, Vec<SmolStr>>,
    experimental_model_prop_name: ModelPropNames,
}

impl RawVueCompilerOptions {
    /// Reads options from a JSON object.
    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(text).map_err(OptionsError::Json)
    }
}

/// Accumulates raw options; later additions win.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptionsBuilder {
    resolved: RawVueCompilerOptions,
    target: Option<f64>,
}

impl CompilerOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut options: RawVueCompilerOptions) -> &mut Self {
        match options.target.take() {
            Some(RawTarget::Version(version)) => self.target = Some(version),
            Some(RawTarget::Named(name)) => {
                tracing::debug!(%name, "named target is not resolved, keeping the default");
            }
            None => {}
        }
        if let Some(strict) = options.strict_templates.take() {
            let resolved = &mut self.resolved;
            resolved.strict_v_model.get_or_insert(strict);
            resolved.check_unknown_props.get_or_insert(strict);
            resolved.check_unknown_events.get_or_insert(strict);
            resolved.check_unknown_directives.get_or_insert(strict);
            resolved.check_unknown_components.get_or_insert(strict);
        }
        self.resolved.merge(options);
        self
    }

    /// Resolves the accumulated options over the built-in defaults.
    pub fn build(&self) -> VueCompilerOptions {
        let lib = self.resolved.lib.as_deref().unwrap_or("vue");
        let defaults = VueCompilerOptions::defaults(self.target.unwrap_or(DEFAULT_TARGET), lib);
        self.build_over(&defaults)
    }
}

/// Parses `@key value` overrides from top-level comments.
///
/// Only the first such line of each comment counts. A value that is not
/// valid JSON, or does not fit the option, is skipped.
pub fn parse_local_options(comments: &[String]) -> Option<RawVueCompilerOptions> {
    let mut found = false;
    let mut options = RawVueCompilerOptions::default();
    for comment in comments {
        let Some((key, value)) = comment.lines().find_map(option_line) else {
            continue;
        };
        let entry = match serde_json::from_str::<serde_json::Value>(value) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(key, %error, "ignoring option comment with invalid JSON");
                continue;
            }
        };
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), entry);
        match serde_json::from_value::<RawVueCompilerOptions>(serde_json::Value::Object(object)) {
            Ok(mut raw) => {
                found = true;
                if let Some(target) = raw.target.take() {
                    options.target = Some(target);
                }
                if let Some(strict) = raw.strict_templates.take() {
                    options.strict_templates = Some(strict);
                }
                options.merge(raw);
            }
            Err(error) => tracing::debug!(key, %error, "ignoring option comment"),
        }
    }
    found.then_some(options)
}

/// Splits `  @key value` into key and value.
fn option_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('@')?;
    let key_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if key_len == 0 {
        return None;
    }
    let (key, value) = rest.split_at(key_len);
    (!value.is_empty()).then_some((key, value))
}
