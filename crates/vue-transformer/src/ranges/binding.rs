//! Top-level bindings and component imports.

use super::{ParsedScript, Range};
use smol_str::SmolStr;
use swc_ecma_ast::*;

/// A name bound by a declaration pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingIdentifier {
    pub name: SmolStr,
    /// The name alone, without any type annotation.
    pub range: Range,
    /// Bound by a rest element (`...rest`).
    pub is_rest: bool,
}

/// Top-level names of a script block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingRanges {
    /// Variables, functions, classes, enums and value imports.
    pub bindings: Vec<Range>,
    /// Default imports of single-file components.
    pub components: Vec<Range>,
}

fn ident_range(parsed: &ParsedScript, ident: &Ident) -> Range {
    let start = parsed.range(ident.span).start;
    Range::new(start, start + ident.sym.len() as u32)
}

/// Collects top-level bindings. `extensions` decides which import sources
/// are components (`.vue` by default).
pub fn collect_binding_ranges(parsed: &ParsedScript, content: &str, extensions: &[String]) -> BindingRanges {
    let mut ranges = BindingRanges::default();
    let Some(module) = &parsed.module else {
        return ranges;
    };

    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => match decl {
                Decl::Var(var) => {
                    for declarator in &var.decls {
                        ranges.bindings.extend(
                            collect_binding_identifiers(parsed, &declarator.name)
                                .into_iter()
                                .map(|binding| binding.range),
                        );
                    }
                }
                Decl::Class(class) => ranges.bindings.push(ident_range(parsed, &class.ident)),
                Decl::Fn(function) => ranges.bindings.push(ident_range(parsed, &function.ident)),
                Decl::TsEnum(ts_enum) => ranges.bindings.push(ident_range(parsed, &ts_enum.id)),
                _ => {}
            },
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                if import.type_only {
                    continue;
                }
                let source = parsed.range(import.src.span).text(content);
                let source = crate::text::unquote(source);
                let is_component = extensions.iter().any(|ext| source.ends_with(ext.as_str()));

                for specifier in &import.specifiers {
                    match specifier {
                        ImportSpecifier::Default(default) => {
                            let range = ident_range(parsed, &default.local);
                            if is_component {
                                ranges.components.push(range);
                            } else {
                                ranges.bindings.push(range);
                            }
                        }
                        ImportSpecifier::Namespace(namespace) => {
                            ranges.bindings.push(ident_range(parsed, &namespace.local));
                        }
                        ImportSpecifier::Named(named) => {
                            if named.is_type_only {
                                continue;
                            }
                            let range = ident_range(parsed, &named.local);
                            let imports_default = matches!(
                                &named.imported,
                                Some(ModuleExportName::Ident(imported)) if &*imported.sym == "default"
                            );
                            if is_component && imports_default {
                                ranges.components.push(range);
                            } else {
                                ranges.bindings.push(range);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    ranges
}

/// Every name bound by a declaration pattern, in source order.
pub fn collect_binding_identifiers(parsed: &ParsedScript, pat: &Pat) -> Vec<BindingIdentifier> {
    let mut out = Vec::new();
    walk_pattern(parsed, pat, false, &mut out);
    out
}

fn walk_pattern(parsed: &ParsedScript, pat: &Pat, is_rest: bool, out: &mut Vec<BindingIdentifier>) {
    match pat {
        Pat::Ident(binding) => out.push(BindingIdentifier {
            name: SmolStr::new(&*binding.id.sym),
            range: ident_range(parsed, &binding.id),
            is_rest,
        }),
        Pat::Rest(rest) => walk_pattern(parsed, &rest.arg, true, out),
        Pat::Assign(assign) => walk_pattern(parsed, &assign.left, is_rest, out),
        Pat::Array(array) => {
            for element in array.elems.iter().flatten() {
                walk_pattern(parsed, element, false, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(key_value) => walk_pattern(parsed, &key_value.value, false, out),
                    ObjectPatProp::Assign(assign) => out.push(BindingIdentifier {
                        name: SmolStr::new(&*assign.key.id.sym),
                        range: ident_range(parsed, &assign.key.id),
                        is_rest: false,
                    }),
                    ObjectPatProp::Rest(rest) => walk_pattern(parsed, &rest.arg, true, out),
                }
            }
        }
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}
