//! `v-if` chains.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use vue_parser::IfNode;

impl<'a> TemplateContext<'a> {
    /// One `if`/`else if`/`else` statement per chain. Each condition stays
    /// in [`conditions`](TemplateContext::conditions) while its branch is
    /// generated and is negated for the branches that follow it.
    pub fn v_if(&mut self, node: &'a IfNode) {
        let depth = self.conditions.len();

        for (index, branch) in node.branches.iter().enumerate() {
            match (index, &branch.condition) {
                (0, _) => self.codes.text("if "),
                (_, Some(_)) => self.codes.text("else if "),
                (_, None) => self.codes.text("else "),
            }

            let mut added = false;
            if let Some(condition) = &branch.condition {
                let codes = self.capture(|ctx| {
                    ctx.interpolation(
                        source::TEMPLATE,
                        &condition.content,
                        condition.offset,
                        features::VERIFICATION,
                        "(",
                        ")",
                    )
                });
                self.conditions.push(codes.to_text());
                self.codes.append(codes);
                self.codes.text(" ");
                added = true;
            }

            self.codes.text("{\n");
            for child in &branch.children {
                self.child(child);
            }
            self.codes.text("}\n");

            if added {
                if let Some(last) = self.conditions.last_mut() {
                    *last = format!("!{last}");
                }
            }
        }

        self.conditions.truncate(depth);
    }
}
