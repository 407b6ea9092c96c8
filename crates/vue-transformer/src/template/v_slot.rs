//! Slot contents passed to a component.
//!
//! The slot function is taken from the component context and its
//! parameters are destructured with the pattern written in `v-slot`, so
//! the names used by the children get the types the component declares.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::names::helper;
use crate::ranges::{collect_binding_identifiers, parse_script};
use smol_str::SmolStr;
use swc_common::{BytePos, Span as SwcSpan, Spanned};
use swc_ecma_ast::{Expr, ModuleItem, Pat, Stmt};
use vue_parser::{Directive, Element, ExpressionNode};

/// Start of the annotated name's type and end of the annotation.
fn annotation(pat: &Pat) -> Option<(BytePos, BytePos)> {
    match pat {
        Pat::Ident(binding) => binding.type_ann.as_ref().map(|ann| (ann.span.lo, ann.span.hi)),
        Pat::Array(array) => array.type_ann.as_ref().map(|ann| (ann.span.lo, ann.span.hi)),
        Pat::Object(object) => object.type_ann.as_ref().map(|ann| (ann.span.lo, ann.span.hi)),
        Pat::Rest(rest) => rest.type_ann.as_ref().map(|ann| (rest.arg.span().hi, ann.span.hi)),
        Pat::Assign(assign) => annotation(&assign.left),
        _ => None,
    }
}

impl<'a> TemplateContext<'a> {
    pub fn v_slot(&mut self, element: &'a Element, slot_dir: Option<&'a Directive>, ctx_var: &str) {
        let slot_var = self.internal_variable();

        match slot_dir {
            Some(dir) => {
                self.codes.text("{\nconst { ");
                match dir.arg.as_ref().filter(|arg| !arg.content.is_empty()) {
                    Some(arg) if arg.is_static => {
                        self.object_property(&arg.content, arg.offset, features::VERIFICATION, false, true);
                    }
                    Some(arg) => {
                        let code = format!("[{}]", arg.content);
                        self.object_property(&code, arg.offset - 1, features::VERIFICATION, false, true);
                    }
                    None => {
                        let start = u32::from(dir.span.start);
                        self.codes.bounded(
                            source::TEMPLATE,
                            start,
                            start + dir.raw_name.len() as u32,
                            features::VERIFICATION,
                            "default",
                        );
                    }
                }
            }
            None => self.codes.text("const { default"),
        }
        self.codes.text(format!(": {slot_var} }} = {ctx_var}.slots!;\n"));

        self.push_scope();
        if let Some(exp) = slot_dir.and_then(|dir| dir.exp.as_ref()) {
            self.slot_parameters(exp, &slot_var);
        }
        for child in &element.children {
            self.child(child);
        }
        self.pop_scope();

        if slot_dir.is_some() {
            self.codes.text("}\n");
        }
    }

    /// `const [params] = __VLS_vSlot(slot);` with the type annotations of the
    /// parameters commented out and passed as a function type instead.
    fn slot_parameters(&mut self, exp: &ExpressionNode, slot_var: &str) {
        let text = format!("({}) => {{}}", exp.content);
        let parsed = parse_script(&text, "ts");
        let Some(module) = &parsed.module else {
            return;
        };
        let Some(ModuleItem::Stmt(Stmt::Expr(statement))) = module.body.first() else {
            return;
        };
        let Expr::Arrow(arrow) = &*statement.expr else {
            return;
        };

        let start = exp.offset.saturating_sub(1);
        let end = start + text.len() as u32;
        let mut params = self.capture(|ctx| {
            ctx.interpolation(source::TEMPLATE, &text, start, features::VERIFICATION, "", "")
        });
        params.replace_source_range(source::TEMPLATE, start, start + 1, "");
        params.replace_source_range(source::TEMPLATE, end - ") => {}".len() as u32, end, "");

        let mut types = Vec::with_capacity(arrow.params.len());
        for param in &arrow.params {
            let Some((lo, hi)) = annotation(param) else {
                types.push(None);
                continue;
            };
            let range = parsed.range(SwcSpan::new(lo, hi));
            types.push(Some((range.text(&text).to_string(), start + range.start)));
            params.replace_source_range(source::TEMPLATE, start + range.start, start + range.start, "/* ");
            params.replace_source_range(source::TEMPLATE, start + range.end, start + range.end, " */");
        }

        self.codes.text("const [");
        self.codes.append(params);
        self.codes.text(format!("] = {}({slot_var}!", helper::V_SLOT));
        if types.iter().any(Option::is_some) {
            self.codes.text(", ");
            let boundary = self.codes.open(source::TEMPLATE, exp.offset, features::VERIFICATION);
            self.codes.text("(");
            for ty in types {
                match ty {
                    Some((annotation, offset)) => {
                        self.codes.text("_");
                        self.codes.mapped(annotation, source::TEMPLATE, offset, features::VERIFICATION);
                        self.codes.text(", ");
                    }
                    None => self.codes.text("_, "),
                }
            }
            self.codes.text(") => {}");
            self.codes.close(boundary, exp.end());
        }
        self.codes.text(");\n");

        let names: Vec<SmolStr> = arrow
            .params
            .iter()
            .flat_map(|param| collect_binding_identifiers(&parsed, param))
            .map(|binding| binding.name)
            .collect();
        self.declare(names);
    }
}

#[cfg(test)]
mod tests {
    use crate::options::VueCompilerOptions;
    use crate::template::{generate_template, TemplateOptions};
    use rustc_hash::FxHashSet;

    fn generate(template: &str) -> String {
        let fragment = vue_parser::parse_template(template).fragment;
        let compiler = VueCompilerOptions::default();
        let names = FxHashSet::default();
        let options = TemplateOptions::new(&compiler, &names, &names);
        generate_template(&options, template, Some(&fragment)).codes.to_text()
    }

    #[test]
    fn test_default_slot_on_component() {
        let text = generate("<Comp v-slot=\"{ item }\">{{ item }}</Comp>");
        assert!(text.contains("{\nconst { default: __VLS_6 } = __VLS_3.slots!;\n"));
        assert!(text.contains("const [{ item }] = __VLS_vSlot(__VLS_6!);\n( item );\n}\n"));
        assert!(!text.contains("__VLS_ctx.item"));
    }

    #[test]
    fn test_typed_slot_parameters() {
        let text = generate("<Comp><template #item=\"{ row }: { row: number }\">{{ row }}</template></Comp>");
        assert!(text.contains("const { default: __VLS_6 } = __VLS_3.slots!;\n"));
        assert!(text.contains("{\nconst { item: __VLS_7 } = __VLS_3.slots!;\n"));
        assert!(text.contains(
            "const [{ row }/* : { row: number } */] = __VLS_vSlot(__VLS_7!, (_: { row: number }, ) => {});\n"
        ));
    }

    #[test]
    fn test_dynamic_slot_name() {
        let text = generate("<Comp><template #[name]=\"props\"></template></Comp>");
        assert!(text.contains("const { [__VLS_tryAsConstant(__VLS_ctx.name)]: __VLS_7 } = __VLS_3.slots!;\n"));
        assert!(text.contains("const [props] = __VLS_vSlot(__VLS_7!);\n"));
    }
}
