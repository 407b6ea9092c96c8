//! Ranges of a `<script setup>` block: macro and composable calls.
//!
//! Calls are found anywhere in the block except inside function bodies.

use super::binding::{collect_binding_identifiers, collect_binding_ranges, BindingRanges};
use super::script::object_properties;
use super::{ParsedScript, Range};
use crate::options::VueCompilerOptions;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use swc_common::Spanned;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// A call expression with its interesting parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRange {
    pub call: Range,
    /// The callee.
    pub exp: Range,
    /// The first argument.
    pub arg: Option<Range>,
    /// The first type argument.
    pub type_arg: Option<Range>,
}

/// A macro call that may be assigned to a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroAssignment {
    pub call: CallRange,
    /// The variable the result is assigned to, when it is a plain identifier.
    pub name: Option<SmolStr>,
    /// The enclosing statement, ending at its last child (before any `;`).
    pub statement: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineProps {
    pub assignment: MacroAssignment,
    /// Names bound by a destructuring declaration.
    pub destructured: Vec<SmolStr>,
    pub destructured_rest: Option<SmolStr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefineModel {
    /// The variable holding the model ref.
    pub local_name: Option<Range>,
    /// The name string literal, quotes included.
    pub name: Option<Range>,
    pub type_arg: Option<Range>,
    pub modifier_type: Option<Range>,
    pub runtime_type: Option<Range>,
    pub default_value: Option<Range>,
    pub required: bool,
    /// The closest block comment before the enclosing statement.
    pub comments: Option<Range>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefineOptions {
    pub name: Option<SmolStr>,
    pub inherit_attrs: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseTemplateRef {
    pub call: CallRange,
    pub name: Option<SmolStr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSetupRanges {
    /// End of a leading `// @ts-check` or `// @ts-nocheck` comment.
    pub leading_comment_end_offset: u32,
    /// Start of the first statement that is not an import or export; the
    /// block length when every statement is one.
    pub import_section_end_offset: u32,
    pub bindings: BindingRanges,
    pub define_model: Vec<DefineModel>,
    pub define_props: Option<DefineProps>,
    pub with_defaults: Option<CallRange>,
    pub define_emits: Option<MacroAssignment>,
    pub define_slots: Option<MacroAssignment>,
    pub define_expose: Option<CallRange>,
    pub define_options: Option<DefineOptions>,
    pub use_attrs: Vec<CallRange>,
    pub use_css_module: Vec<CallRange>,
    pub use_slots: Vec<CallRange>,
    pub use_template_ref: Vec<UseTemplateRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MacroKind {
    DefineProps,
    DefineSlots,
    DefineEmits,
    DefineExpose,
    DefineModel,
    DefineOptions,
    WithDefaults,
    UseAttrs,
    UseCssModule,
    UseSlots,
    UseTemplateRef,
}

impl MacroKind {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "defineProps" => MacroKind::DefineProps,
            "defineSlots" => MacroKind::DefineSlots,
            "defineEmits" => MacroKind::DefineEmits,
            "defineExpose" => MacroKind::DefineExpose,
            "defineModel" => MacroKind::DefineModel,
            "defineOptions" => MacroKind::DefineOptions,
            "withDefaults" => MacroKind::WithDefaults,
            "useAttrs" => MacroKind::UseAttrs,
            "useCssModule" => MacroKind::UseCssModule,
            "useSlots" => MacroKind::UseSlots,
            "useTemplateRef" => MacroKind::UseTemplateRef,
            _ => return None,
        })
    }
}

fn is_ts_check(comment: &str) -> bool {
    let Some(rest) = comment.trim_start().strip_prefix("@ts-") else {
        return false;
    };
    let rest = rest.strip_prefix("no").unwrap_or(rest);
    match rest.strip_prefix("check") {
        Some(tail) => tail.is_empty() || tail.starts_with(char::is_whitespace),
        None => false,
    }
}

pub fn collect_script_setup_ranges(parsed: &ParsedScript, content: &str, options: &VueCompilerOptions) -> ScriptSetupRanges {
    let mut ranges = ScriptSetupRanges {
        bindings: collect_binding_ranges(parsed, content, &options.extensions),
        ..ScriptSetupRanges::default()
    };
    let Some(module) = &parsed.module else {
        return ranges;
    };

    if let Some(first) = module.body.first() {
        let start = parsed.range(first.span()).start;
        ranges.leading_comment_end_offset = parsed
            .leading_comments(content, start)
            .iter()
            .rev()
            .find(|comment| !comment.block && is_ts_check(&comment.text))
            .map_or(0, |comment| comment.range.end);
    }

    // A block of only imports is all import section.
    ranges.import_section_end_offset = content.len() as u32;
    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Empty(_)) => continue,
            ModuleItem::ModuleDecl(
                ModuleDecl::Import(_)
                | ModuleDecl::ExportAll(_)
                | ModuleDecl::ExportDecl(_)
                | ModuleDecl::ExportNamed(_)
                | ModuleDecl::ExportDefaultDecl(_)
                | ModuleDecl::ExportDefaultExpr(_),
            ) => continue,
            _ => {}
        }
        let start = parsed.range(item.span()).start;
        ranges.import_section_end_offset = parsed
            .leading_comments(content, start)
            .first()
            .map_or(start, |comment| comment.range.start);
        break;
    }

    let mut callees = FxHashMap::default();
    for (key, aliases) in options.macros.iter().chain(&options.composables) {
        if let Some(kind) = MacroKind::from_key(key) {
            for alias in aliases {
                callees.insert(alias.clone(), kind);
            }
        }
    }

    let mut collector = MacroCollector {
        parsed,
        content,
        callees,
        ranges: &mut ranges,
        statement: None,
        parent: Parent::Other,
    };
    module.visit_with(&mut collector);
    tracing::trace!(
        models = ranges.define_model.len(),
        props = ranges.define_props.is_some(),
        emits = ranges.define_emits.is_some(),
        "collected script setup ranges"
    );
    ranges
}

/// What directly contains the call being visited.
#[derive(Debug, Clone, Default)]
enum Parent {
    #[default]
    Other,
    /// `const <pattern> = call()`.
    Declarator {
        ident: Option<(SmolStr, Range)>,
        destructured: Option<(Vec<SmolStr>, Option<SmolStr>)>,
    },
    /// `withDefaults(call(), ...)`, itself assigned to `ident`.
    WithDefaults { ident: Option<SmolStr> },
}

impl Parent {
    fn ident_name(&self) -> Option<SmolStr> {
        match self {
            Parent::Declarator {
                ident: Some((name, _)), ..
            } => Some(name.clone()),
            _ => None,
        }
    }
}

struct MacroCollector<'a> {
    parsed: &'a ParsedScript,
    content: &'a str,
    callees: FxHashMap<SmolStr, MacroKind>,
    ranges: &'a mut ScriptSetupRanges,
    /// The innermost enclosing statement.
    statement: Option<Range>,
    parent: Parent,
}

impl MacroCollector<'_> {
    fn call_range(&self, call: &CallExpr) -> CallRange {
        CallRange {
            call: self.parsed.range(call.span),
            exp: self.parsed.range(call.callee.span()),
            arg: call.args.first().map(|arg| self.parsed.range(arg.expr.span())),
            type_arg: call
                .type_args
                .as_ref()
                .and_then(|args| args.params.first())
                .map(|param| self.parsed.range(param.span())),
        }
    }

    fn assignment(&self, call: &CallExpr, parent: &Parent) -> MacroAssignment {
        MacroAssignment {
            call: self.call_range(call),
            name: parent.ident_name(),
            statement: self.statement.unwrap_or_else(|| self.parsed.range(call.span)),
        }
    }

    fn string_value(&self, lit: &Str) -> SmolStr {
        SmolStr::new(crate::text::unquote(self.parsed.range(lit.span).text(self.content)))
    }

    fn record(&mut self, kind: MacroKind, call: &CallExpr, parent: &Parent) {
        match kind {
            MacroKind::DefineModel => {
                let model = self.define_model(call, parent);
                self.ranges.define_model.push(model);
            }
            MacroKind::DefineProps => {
                let mut props = DefineProps {
                    assignment: self.assignment(call, parent),
                    destructured: Vec::new(),
                    destructured_rest: None,
                };
                match parent {
                    Parent::Declarator {
                        destructured: Some((names, rest)),
                        ..
                    } => {
                        props.destructured = names.clone();
                        props.destructured_rest = rest.clone();
                    }
                    Parent::WithDefaults { ident } => props.assignment.name = ident.clone(),
                    _ => {}
                }
                self.ranges.define_props = Some(props);
            }
            MacroKind::WithDefaults => {
                let range = self.call_range(call);
                self.ranges.with_defaults = Some(CallRange {
                    arg: call.args.get(1).map(|arg| self.parsed.range(arg.expr.span())),
                    type_arg: None,
                    ..range
                });
            }
            MacroKind::DefineEmits => self.ranges.define_emits = Some(self.assignment(call, parent)),
            MacroKind::DefineSlots => self.ranges.define_slots = Some(self.assignment(call, parent)),
            MacroKind::DefineExpose => self.ranges.define_expose = Some(self.call_range(call)),
            MacroKind::DefineOptions => {
                let mut options = DefineOptions::default();
                if let Some(Expr::Object(object)) = call.args.first().map(|arg| &*arg.expr) {
                    for (key, value) in object_properties(object) {
                        match (key, value) {
                            ("name", Expr::Lit(Lit::Str(value))) => options.name = Some(self.string_value(value)),
                            ("inheritAttrs", Expr::Lit(Lit::Bool(value))) => options.inherit_attrs = Some(value.value),
                            _ => {}
                        }
                    }
                }
                self.ranges.define_options = Some(options);
            }
            MacroKind::UseAttrs | MacroKind::UseCssModule | MacroKind::UseSlots => {
                let range = self.call_range(call);
                match kind {
                    MacroKind::UseAttrs => self.ranges.use_attrs.push(range),
                    MacroKind::UseCssModule => self.ranges.use_css_module.push(range),
                    _ => self.ranges.use_slots.push(range),
                }
            }
            MacroKind::UseTemplateRef => {
                let use_ref = UseTemplateRef {
                    call: self.call_range(call),
                    name: parent.ident_name(),
                };
                self.ranges.use_template_ref.push(use_ref);
            }
        }
    }

    fn define_model(&self, call: &CallExpr, parent: &Parent) -> DefineModel {
        let mut model = DefineModel {
            comments: self.parsed.closest_block_comment(
                self.content,
                self.statement.map_or(self.parsed.range(call.span).start, |statement| statement.start),
            ),
            ..DefineModel::default()
        };
        if let Parent::Declarator {
            ident: Some((_, range)), ..
        } = parent
        {
            model.local_name = Some(*range);
        }
        if let Some(type_args) = &call.type_args {
            model.type_arg = type_args.params.first().map(|param| self.parsed.range(param.span()));
            model.modifier_type = type_args.params.get(1).map(|param| self.parsed.range(param.span()));
        }

        let (name, options) = match call.args.as_slice() {
            [] => (None, None),
            [only] => match &*only.expr {
                Expr::Lit(Lit::Str(_)) => (Some(&*only.expr), None),
                _ => (None, Some(&*only.expr)),
            },
            [name, options, ..] => (Some(&*name.expr), Some(&*options.expr)),
        };
        if let Some(Expr::Lit(Lit::Str(name))) = name {
            model.name = Some(self.parsed.range(name.span));
        }
        if let Some(Expr::Object(object)) = options {
            for (key, value) in object_properties(object) {
                match (key, value) {
                    ("type", value) => model.runtime_type = Some(self.parsed.range(value.span())),
                    ("default", value) => model.default_value = Some(self.parsed.range(value.span())),
                    ("required", Expr::Lit(Lit::Bool(value))) if value.value => model.required = true,
                    _ => {}
                }
            }
        }
        model
    }

    /// The statement range ends at its last child, which leaves out a
    /// trailing semicolon.
    fn statement_range(&self, stmt: &Stmt) -> Range {
        let mut range = self.parsed.range(stmt.span());
        let last_child = match stmt {
            Stmt::Expr(expr) => Some(expr.expr.span()),
            Stmt::Decl(Decl::Var(var)) => var.decls.last().map(|decl| decl.span),
            Stmt::Return(ret) => ret.arg.as_ref().map(|arg| arg.span()),
            Stmt::Throw(throw) => Some(throw.arg.span()),
            _ => None,
        };
        if let Some(span) = last_child {
            range.end = self.parsed.range(span).end;
        }
        range
    }
}

impl Visit for MacroCollector<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        let outer = self.statement.replace(self.statement_range(stmt));
        stmt.visit_children_with(self);
        self.statement = outer;
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        self.parent = Parent::Other;
        declarator.name.visit_with(self);
        let Some(init) = &declarator.init else {
            return;
        };
        self.parent = match (&declarator.name, &**init) {
            (Pat::Ident(binding), Expr::Call(_)) => Parent::Declarator {
                ident: Some((SmolStr::new(&*binding.id.sym), {
                    let start = self.parsed.range(binding.id.span).start;
                    Range::new(start, start + binding.id.sym.len() as u32)
                })),
                destructured: None,
            },
            (Pat::Object(_), Expr::Call(_)) => {
                let mut names = Vec::new();
                let mut rest = None;
                for binding in collect_binding_identifiers(self.parsed, &declarator.name) {
                    if binding.is_rest {
                        rest = Some(binding.name);
                    } else {
                        names.push(binding.name);
                    }
                }
                Parent::Declarator {
                    ident: None,
                    destructured: Some((names, rest)),
                }
            }
            _ => Parent::Other,
        };
        init.visit_with(self);
        self.parent = Parent::Other;
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        let parent = std::mem::take(&mut self.parent);
        let kind = match &call.callee {
            Callee::Expr(callee) => match &**callee {
                Expr::Ident(ident) => self.callees.get(&*ident.sym).copied(),
                _ => None,
            },
            _ => None,
        };
        if let Some(kind) = kind {
            self.record(kind, call, &parent);
        }

        call.callee.visit_with(self);
        call.type_args.visit_with(self);
        for (i, arg) in call.args.iter().enumerate() {
            if i == 0 && kind == Some(MacroKind::WithDefaults) && matches!(&*arg.expr, Expr::Call(_)) {
                self.parent = Parent::WithDefaults {
                    ident: parent.ident_name(),
                };
            }
            arg.visit_with(self);
            self.parent = Parent::Other;
        }
    }

    // Macros inside functions are not collected.
    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_constructor(&mut self, _: &Constructor) {}
    fn visit_getter_prop(&mut self, _: &GetterProp) {}
    fn visit_setter_prop(&mut self, _: &SetterProp) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::parse_script;
    use pretty_assertions::assert_eq;

    fn collect(content: &str) -> ScriptSetupRanges {
        let parsed = parse_script(content, "ts");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        collect_script_setup_ranges(&parsed, content, &VueCompilerOptions::default())
    }

    #[test]
    fn test_define_props_with_type() {
        let content = "import { ref } from 'vue'\nconst props = defineProps<{ msg: string }>();\n";
        let ranges = collect(content);
        let props = ranges.define_props.unwrap();
        assert_eq!(props.assignment.name.as_deref(), Some("props"));
        assert_eq!(props.assignment.call.type_arg.unwrap().text(content), "{ msg: string }");
        assert_eq!(
            props.assignment.statement.text(content),
            "const props = defineProps<{ msg: string }>()"
        );
        assert_eq!(ranges.import_section_end_offset, 26);
    }

    #[test]
    fn test_with_defaults_names_the_props() {
        let content = "const p = withDefaults(defineProps<{ a?: number }>(), { a: 1 })";
        let ranges = collect(content);
        assert_eq!(ranges.define_props.unwrap().assignment.name.as_deref(), Some("p"));
        let with_defaults = ranges.with_defaults.unwrap();
        assert_eq!(with_defaults.arg.unwrap().text(content), "{ a: 1 }");
        assert_eq!(with_defaults.exp.text(content), "withDefaults");
    }

    #[test]
    fn test_destructured_props() {
        let content = "const { a, b: c, ...rest } = defineProps(['a', 'b'])";
        let props = collect(content).define_props.unwrap();
        assert_eq!(props.assignment.name, None);
        assert_eq!(props.destructured, vec!["a", "c"]);
        assert_eq!(props.destructured_rest.as_deref(), Some("rest"));
        assert_eq!(props.assignment.call.arg.unwrap().text(content), "['a', 'b']");
    }

    #[test]
    fn test_define_model() {
        let content = "/** the count */\nconst count = defineModel<number, 'trim'>('count', { required: true, default: 0 })";
        let ranges = collect(content);
        let model = &ranges.define_model[0];
        assert_eq!(model.local_name.unwrap().text(content), "count");
        assert_eq!(model.name.unwrap().text(content), "'count'");
        assert_eq!(model.type_arg.unwrap().text(content), "number");
        assert_eq!(model.modifier_type.unwrap().text(content), "'trim'");
        assert_eq!(model.default_value.unwrap().text(content), "0");
        assert!(model.required);
        assert_eq!(model.comments.unwrap().text(content), "/** the count */");
    }

    #[test]
    fn test_define_model_options_only() {
        let content = "const m = defineModel({ type: String })";
        let model = &collect(content).define_model[0];
        assert_eq!(model.name, None);
        assert_eq!(model.runtime_type.unwrap().text(content), "String");
    }

    #[test]
    fn test_calls_inside_functions_are_skipped() {
        let content = "function f() { defineEmits() }\nconst g = () => useAttrs();\nconst attrs = useAttrs()";
        let ranges = collect(content);
        assert!(ranges.define_emits.is_none());
        assert_eq!(ranges.use_attrs.len(), 1);
    }

    #[test]
    fn test_define_options_and_template_refs() {
        let content = "defineOptions({ name: 'Foo', inheritAttrs: false })\nconst el = useTemplateRef('el')\nconst other = templateRef('x')";
        let ranges = collect(content);
        let options = ranges.define_options.unwrap();
        assert_eq!(options.name.as_deref(), Some("Foo"));
        assert_eq!(options.inherit_attrs, Some(false));
        let names: Vec<_> = ranges.use_template_ref.iter().map(|r| r.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["el", "other"]);
    }

    #[test]
    fn test_expression_statement_range() {
        let content = "defineExpose({ a: 1 });\ndefineEmits<{ (e: 'x'): void }>();";
        let ranges = collect(content);
        assert_eq!(ranges.define_expose.unwrap().arg.unwrap().text(content), "{ a: 1 }");
        let emits = ranges.define_emits.unwrap();
        assert_eq!(emits.name, None);
        assert_eq!(emits.statement.text(content), "defineEmits<{ (e: 'x'): void }>()");
    }

    #[test]
    fn test_ts_check_comment() {
        let content = "// @ts-check\nimport a from 'a'\nconst b = 1";
        let ranges = collect(content);
        assert_eq!(ranges.leading_comment_end_offset, 12);
        assert_eq!(ranges.import_section_end_offset, 31);
        assert!(is_ts_check(" @ts-nocheck"));
        assert!(!is_ts_check(" @ts-checked"));
    }
}
