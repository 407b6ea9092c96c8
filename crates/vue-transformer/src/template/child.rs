//! Dispatch over template nodes.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::text;
use vue_parser::{Element, TagType, TemplateNode};

impl<'a> TemplateContext<'a> {
    /// Generates the top-level nodes, recording which element is the single
    /// root of the template.
    pub fn root(&mut self, nodes: &'a [TemplateNode]) {
        self.collect_single_root_nodes(nodes);
        for node in nodes {
            self.child(node);
        }
    }

    fn collect_single_root_nodes(&mut self, nodes: &[TemplateNode]) {
        let mut meaningful = nodes.iter().filter(|node| match node {
            TemplateNode::Comment(_) => false,
            TemplateNode::Text(text) => !text.data.trim().is_empty(),
            _ => true,
        });
        let (Some(only), None) = (meaningful.next(), meaningful.next()) else {
            self.single_root_nodes.insert(None);
            return;
        };

        match only {
            TemplateNode::If(if_node) => {
                for branch in &if_node.branches {
                    self.collect_single_root_nodes(&branch.children);
                }
            }
            TemplateNode::Element(element) => {
                self.single_root_nodes.insert(Some(element.span.start.into()));
                let name = text::hyphenate(&element.tag);
                if self.options.compiler.fallthrough_component_names.contains(&name) {
                    self.collect_single_root_nodes(&element.children);
                }
            }
            _ => {}
        }
    }

    pub fn is_single_root(&self, element: &Element) -> bool {
        self.single_root_nodes.contains(&Some(element.span.start.into()))
    }

    /// Generates one node and everything below it.
    pub fn child(&mut self, node: &'a TemplateNode) {
        if !self.enter(node) {
            return;
        }
        match node {
            TemplateNode::Element(element) => match element.tag_type {
                TagType::Slot => self.slot_outlet(element),
                TagType::Template if element.directive("slot").is_some() && self.in_component() => {
                    let ctx_var = self.component_ctx_var();
                    self.v_slot(element, element.directive("slot"), &ctx_var);
                }
                TagType::Element => self.element(element),
                TagType::Component => self.component(element),
                TagType::Template => self.fragment(element),
            },
            TemplateNode::Interpolation(interpolation) => {
                let expression = &interpolation.expression;
                let (mut start, mut end) = (expression.offset as usize, expression.end() as usize);
                let template = self.source;
                let bytes = template.as_bytes();
                while start > 0 && bytes[start - 1].is_ascii_whitespace() {
                    start -= 1;
                }
                while end < bytes.len() && bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                let code = &template[start..end];
                self.interpolation(source::TEMPLATE, code, start as u32, features::VERIFICATION, "(", ");\n");
            }
            TemplateNode::If(if_node) => self.v_if(if_node),
            TemplateNode::For(for_node) => self.v_for(for_node),
            TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
        }
        self.exit();
    }
}
