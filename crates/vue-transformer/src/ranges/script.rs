//! Ranges of a plain `<script>` block.

use super::{collect_binding_ranges, BindingRanges, ParsedScript, Range};
use swc_common::Spanned;
use swc_ecma_ast::*;

/// Options found in the object passed to `export default`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// The exported expression is the object itself.
    pub is_object_literal: bool,
    /// The exported expression after unwrapping `as` and parentheses.
    pub expression: Range,
    /// The options object.
    pub args: Range,
    pub components: Option<Range>,
    pub directives: Option<Range>,
    /// The `name` string literal, quotes included.
    pub name: Option<Range>,
    pub inherit_attrs: Option<bool>,
}

/// The `export default` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDefault {
    /// The statement, extended to a directly preceding block comment.
    pub range: Range,
    pub is_object_literal: bool,
    pub expression: Range,
    pub options: Option<ExportOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRanges {
    pub export_default: Option<ExportDefault>,
    pub bindings: BindingRanges,
}

/// Returns the `key: value` pairs of an object literal with identifier keys.
pub(crate) fn object_properties(object: &ObjectLit) -> impl Iterator<Item = (&str, &Expr)> + '_ {
    object.props.iter().filter_map(|prop| match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(KeyValueProp {
                key: PropName::Ident(key),
                value,
            }) => Some((&*key.sym, &**value)),
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    })
}

pub fn collect_script_ranges(parsed: &ParsedScript, content: &str, extensions: &[String]) -> ScriptRanges {
    let bindings = collect_binding_ranges(parsed, content, extensions);
    let export_default = parsed.module.as_ref().and_then(|module| {
        module.body.iter().find_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                Some(export_default_expr(parsed, content, export))
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => Some(ExportDefault {
                range: statement_range(parsed, content, export.span),
                is_object_literal: false,
                expression: parsed.range(export.decl.span()),
                options: None,
            }),
            _ => None,
        })
    });
    ScriptRanges {
        export_default,
        bindings,
    }
}

fn statement_range(parsed: &ParsedScript, content: &str, span: swc_common::Span) -> Range {
    let mut range = parsed.range(span);
    if let Some(comment) = parsed.closest_block_comment(content, range.start) {
        range.start = comment.start;
    }
    range
}

fn export_default_expr(parsed: &ParsedScript, content: &str, export: &ExportDefaultExpr) -> ExportDefault {
    let mut expr = &*export.expr;
    loop {
        match expr {
            Expr::TsAs(as_expr) => expr = &*as_expr.expr,
            Expr::Paren(paren) => expr = &*paren.expr,
            _ => break,
        }
    }

    let object = match expr {
        Expr::Object(object) => Some(object),
        Expr::Call(call) => call.args.first().and_then(|arg| match &*arg.expr {
            Expr::Object(object) if arg.spread.is_none() => Some(object),
            _ => None,
        }),
        _ => None,
    };

    let options = object.map(|object| {
        let mut options = ExportOptions {
            is_object_literal: matches!(expr, Expr::Object(_)),
            expression: parsed.range(expr.span()),
            args: parsed.range(object.span),
            ..ExportOptions::default()
        };
        for (key, value) in object_properties(object) {
            match (key, value) {
                ("components", Expr::Object(value)) => options.components = Some(parsed.range(value.span)),
                ("directives", Expr::Object(value)) => options.directives = Some(parsed.range(value.span)),
                ("name", Expr::Lit(Lit::Str(value))) => options.name = Some(parsed.range(value.span)),
                ("inheritAttrs", Expr::Lit(Lit::Bool(value))) => options.inherit_attrs = Some(value.value),
                _ => {}
            }
        }
        options
    });

    ExportDefault {
        range: statement_range(parsed, content, export.span),
        is_object_literal: matches!(&*export.expr, Expr::Object(_)),
        expression: parsed.range(export.expr.span()),
        options,
    }
}
