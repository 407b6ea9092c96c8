//! Template expressions rewritten to read from the component context.
//!
//! Free identifiers become `__VLS_ctx.name` (or `__VLS_dollars.$name` for the
//! inferred dollar variables). Names bound inside the expression, names in
//! an enclosing template scope and the allowed globals stay as written.

use super::context::TemplateContext;
use crate::names::{self, value};
use crate::ranges::{collect_binding_identifiers, parse_script, ParsedScript};
use crate::text;
use smol_str::SmolStr;
use source_map::{CodeInfo, SourceId};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// Globals usable in templates without going through the context.
const ALLOWED_GLOBALS: &[&str] = &[
    "Infinity",
    "undefined",
    "NaN",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "Math",
    "Number",
    "Date",
    "Array",
    "Object",
    "Boolean",
    "String",
    "RegExp",
    "Map",
    "Set",
    "JSON",
    "Intl",
    "BigInt",
    "console",
    "Error",
    "Symbol",
];

/// A free identifier of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub name: SmolStr,
    /// Offset in the parsed text.
    pub offset: usize,
    /// Written as a shorthand property, `{ name }`.
    pub shorthand: bool,
}

/// Finds identifiers that are not bound inside the parsed text.
struct ReferenceCollector<'p> {
    parsed: &'p ParsedScript,
    scopes: Vec<Vec<SmolStr>>,
    found: Vec<Reference>,
}

impl ReferenceCollector<'_> {
    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.iter().any(|local| local == name))
    }

    fn record(&mut self, ident: &Ident, shorthand: bool) {
        if self.is_local(&ident.sym) {
            return;
        }
        self.found.push(Reference {
            name: SmolStr::new(&*ident.sym),
            offset: self.parsed.range(ident.span).start as usize,
            shorthand,
        });
    }

    fn declare_pattern(&mut self, pat: &Pat) {
        let names = collect_binding_identifiers(self.parsed, pat);
        if let Some(scope) = self.scopes.last_mut() {
            scope.extend(names.into_iter().map(|binding| binding.name));
        }
    }

    fn scoped(&mut self, visit: impl FnOnce(&mut Self)) {
        self.scopes.push(Vec::new());
        visit(self);
        self.scopes.pop();
    }
}

impl Visit for ReferenceCollector<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.record(ident, false),
            _ => expr.visit_children_with(self),
        }
    }

    fn visit_prop(&mut self, prop: &Prop) {
        match prop {
            Prop::Shorthand(ident) => self.record(ident, true),
            _ => prop.visit_children_with(self),
        }
    }

    fn visit_simple_assign_target(&mut self, target: &SimpleAssignTarget) {
        match target {
            SimpleAssignTarget::Ident(binding) => self.record(&binding.id, false),
            _ => target.visit_children_with(self),
        }
    }

    fn visit_ts_type_query(&mut self, query: &TsTypeQuery) {
        if let TsTypeQueryExpr::TsEntityName(entity) = &query.expr_name {
            let mut entity = entity;
            while let TsEntityName::TsQualifiedName(qualified) = entity {
                entity = &qualified.left;
            }
            if let TsEntityName::Ident(ident) = entity {
                self.record(ident, false);
            }
        }
        query.type_args.visit_with(self);
    }

    fn visit_ts_property_signature(&mut self, signature: &TsPropertySignature) {
        if signature.computed {
            signature.key.visit_with(self);
        }
        signature.type_ann.visit_with(self);
    }

    fn visit_ts_method_signature(&mut self, signature: &TsMethodSignature) {
        if signature.computed {
            signature.key.visit_with(self);
        }
        signature.params.visit_with(self);
        signature.type_ann.visit_with(self);
    }

    fn visit_ts_getter_signature(&mut self, signature: &TsGetterSignature) {
        if signature.computed {
            signature.key.visit_with(self);
        }
        signature.type_ann.visit_with(self);
    }

    fn visit_ts_setter_signature(&mut self, signature: &TsSetterSignature) {
        if signature.computed {
            signature.key.visit_with(self);
        }
        signature.param.visit_with(self);
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.scoped(|this| {
            for param in &arrow.params {
                this.declare_pattern(param);
            }
            arrow.params.visit_with(this);
            arrow.body.visit_with(this);
        });
    }

    fn visit_function(&mut self, function: &Function) {
        self.scoped(|this| {
            for param in &function.params {
                this.declare_pattern(&param.pat);
            }
            function.params.visit_with(this);
            function.body.visit_with(this);
        });
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(SmolStr::new(&*decl.ident.sym));
        }
        decl.function.visit_with(self);
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.scoped(|this| block.visit_children_with(this));
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        self.declare_pattern(&declarator.name);
        declarator.name.visit_with(self);
        declarator.init.visit_with(self);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.scoped(|this| {
            if let Some(param) = &clause.param {
                this.declare_pattern(param);
            }
            clause.body.visit_with(this);
        });
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.scoped(|this| stmt.visit_children_with(this));
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.scoped(|this| stmt.visit_children_with(this));
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.scoped(|this| stmt.visit_children_with(this));
    }
}

/// Free identifiers of `code`, ordered by offset.
pub(crate) fn collect_references(code: &str) -> Vec<Reference> {
    let parsed = parse_script(code, "ts");
    let Some(module) = &parsed.module else {
        return Vec::new();
    };
    let mut collector = ReferenceCollector {
        parsed: &parsed,
        scopes: vec![Vec::new()],
        found: Vec::new(),
    };
    module.visit_with(&mut collector);
    let mut found = collector.found;
    found.sort_by_key(|reference| reference.offset);
    found
}

/// Where the text of one interpolation call lands.
struct Placement {
    source: SourceId,
    start: u32,
    info: CodeInfo,
    prefix_len: usize,
    code_len: usize,
}

impl TemplateContext<'_> {
    fn is_skipped(&self, name: &str) -> bool {
        self.is_declared(name)
            || ALLOWED_GLOBALS.contains(&name)
            || matches!(name, "true" | "false" | "null" | "this" | "require")
            || names::is_synthetic(name)
    }

    /// Writes `prefix + code + suffix` with the free identifiers of `code`
    /// resolved against the context. Only `code` is mapped, starting at
    /// `start` in `source`.
    pub fn interpolation(&mut self, source: SourceId, code: &str, start: u32, info: CodeInfo, prefix: &str, suffix: &str) {
        let full = format!("{prefix}{code}{suffix}");
        let references = if text::is_identifier(code) {
            vec![Reference {
                name: SmolStr::new(code),
                offset: prefix.len(),
                shorthand: false,
            }]
        } else {
            collect_references(&full)
        };
        let placement = Placement {
            source,
            start,
            info,
            prefix_len: prefix.len(),
            code_len: code.len(),
        };

        let mut prev = 0;
        for reference in references {
            if self.is_skipped(&reference.name) {
                continue;
            }
            let name_end = reference.offset + reference.name.len();
            if reference.shorthand {
                self.section(&placement, &full[prev..name_end], prev, false);
                self.codes.text(": ");
            } else {
                self.section(&placement, &full[prev..reference.offset], prev, prev == 0);
            }

            if self.options.setup_refs.contains(reference.name.as_str()) {
                self.section(&placement, &reference.name, reference.offset, false);
                self.codes.text(".value");
            } else {
                self.section(&placement, "", reference.offset, false);
                if self.dollar_vars.contains(reference.name.as_str()) {
                    self.codes.text(format!("{}.", value::DOLLARS));
                } else {
                    self.access_variable(&reference.name);
                    self.codes.text(format!("{}.", value::CTX));
                }
                self.section(&placement, &reference.name, reference.offset, false);
            }
            prev = name_end;
        }
        if prev < full.len() {
            self.section(&placement, &full[prev..], prev, true);
        }
    }

    /// Writes a slice of the parsed text found at `at`. The parts outside
    /// the mapped code are written as plain text.
    fn section(&mut self, placement: &Placement, text: &str, at: usize, start_end: bool) {
        let mut text = text;
        let mut tail = "";
        let code_end = placement.prefix_len + placement.code_len;
        if at + text.len() > code_end {
            let split = text.len().saturating_sub(at + text.len() - code_end);
            tail = &text[split..];
            text = &text[..split];
        }
        let mut offset = at;
        if offset < placement.prefix_len {
            let head = (placement.prefix_len - offset).min(text.len());
            self.codes.text(text[..head].to_string());
            text = &text[head..];
            offset = placement.prefix_len;
        }
        if !(text.is_empty() && start_end) {
            let offset = placement.start + (offset - placement.prefix_len) as u32;
            self.codes.mapped(text, placement.source, offset, placement.info);
        }
        self.codes.text(tail.to_string());
    }
}
