//! `v-for` loops.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::names::helper;
use crate::ranges::{collect_binding_identifiers, parse_script};
use swc_ecma_ast::{Decl, ModuleItem, Stmt};
use vue_parser::ForNode;

/// Names declared by a `v-for` alias list such as `(item, index)`.
fn alias_names(aliases: &str) -> Vec<smol_str::SmolStr> {
    let parsed = parse_script(&format!("const [{aliases}] = [];"), "ts");
    let Some(module) = &parsed.module else {
        return Vec::new();
    };
    let Some(ModuleItem::Stmt(Stmt::Decl(Decl::Var(var)))) = module.body.first() else {
        return Vec::new();
    };
    var.decls
        .iter()
        .flat_map(|declarator| collect_binding_identifiers(&parsed, &declarator.name))
        .map(|binding| binding.name)
        .collect()
}

impl<'a> TemplateContext<'a> {
    pub fn v_for(&mut self, node: &'a ForNode) {
        self.push_scope();

        self.codes.text("for (const [");
        if let Some(span) = node.alias_span() {
            let (start, end) = (u32::from(span.start), u32::from(span.end));
            let aliases = self.source.get(start as usize..end as usize).unwrap_or_default();
            let names = alias_names(aliases);
            self.declare(names);
            self.codes
                .mapped(aliases, source::TEMPLATE, start, features::VERIFICATION);
        }
        self.codes.text("] of ");
        match &node.source {
            Some(exp) => {
                self.codes.text(format!("{}(", helper::V_FOR));
                self.interpolation(source::TEMPLATE, &exp.content, exp.offset, features::VERIFICATION, "(", ")");
                self.codes.text("!)");
            }
            None => self.codes.text("{} as any"),
        }
        self.codes.text(") {\n");

        let in_v_for = std::mem::replace(&mut self.in_v_for, true);
        for child in &node.children {
            self.child(child);
        }
        self.in_v_for = in_v_for;

        self.codes.text("}\n");
        self.pop_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::VueCompilerOptions;
    use crate::template::{generate_template, TemplateOptions};
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;

    fn generate(template: &str) -> String {
        let fragment = vue_parser::parse_template(template).fragment;
        let compiler = VueCompilerOptions::default();
        let names = FxHashSet::default();
        let options = TemplateOptions::new(&compiler, &names, &names);
        generate_template(&options, template, Some(&fragment)).codes.to_text()
    }

    fn names(aliases: &str) -> Vec<String> {
        alias_names(aliases).into_iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_alias_names() {
        assert_eq!(names("item, index"), vec!["item", "index"]);
        assert_eq!(names("{ id, ...rest }, i"), vec!["id", "rest", "i"]);
        assert!(names("").is_empty());
    }

    #[test]
    fn test_loop_declares_aliases() {
        let text = generate("<li v-for=\"(item, i) in items\">{{ item.name }} {{ i }}</li>");
        assert!(text.contains("for (const [item, i] of __VLS_vFor((__VLS_ctx.items)!)) {\n"));
        assert!(text.contains("( item.name );\n"));
        assert!(text.contains("( i );\n"));
        assert!(!text.contains("__VLS_ctx.item.name"));
        assert!(!text.contains("__VLS_ctx.i "));
    }

    #[test]
    fn test_aliases_do_not_leak() {
        let text = generate("<li v-for=\"item in items\"></li><p :title=\"item\"></p>");
        assert!(text.contains("title: (__VLS_ctx.item),\n"));
    }
}
