//! Template parsing tests: structural folding and recovery.

use pretty_assertions::assert_eq;
use vue_parser::{parse_template, ParseErrorKind, TagType, TemplateNode};

/// Renders the node tree as an indented outline.
fn outline(nodes: &[TemplateNode]) -> String {
    fn walk(nodes: &[TemplateNode], depth: usize, out: &mut Vec<String>) {
        let pad = "  ".repeat(depth);
        for node in nodes {
            match node {
                TemplateNode::Element(el) => {
                    out.push(format!("{pad}<{}> {:?}", el.tag, el.tag_type));
                    walk(&el.children, depth + 1, out);
                }
                TemplateNode::Text(text) => out.push(format!("{pad}text {:?}", text.data.trim())),
                TemplateNode::Comment(comment) => out.push(format!("{pad}comment {:?}", comment.data)),
                TemplateNode::Interpolation(interp) => {
                    out.push(format!("{pad}{{{{{}}}}}", interp.expression.content.trim()))
                }
                TemplateNode::If(if_node) => {
                    out.push(format!("{pad}if"));
                    for branch in &if_node.branches {
                        let condition = branch
                            .condition
                            .as_ref()
                            .map_or("else".to_string(), |c| c.content.clone());
                        out.push(format!("{pad}  branch {condition}"));
                        walk(&branch.children, depth + 2, out);
                    }
                }
                TemplateNode::For(for_node) => {
                    let source = for_node.source.as_ref().map_or("", |s| s.content.as_str());
                    out.push(format!("{pad}for {source}"));
                    walk(&for_node.children, depth + 1, out);
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, 0, &mut out);
    out.join("\n")
}

#[test]
fn test_if_chain_folding() {
    let result = parse_template(
        r#"<p v-if="a">A</p>
<!-- dropped -->
<p v-else-if="b">B</p>
<template v-else><i/><b/></template>
<!-- kept -->
<span/>"#,
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    insta::assert_snapshot!(outline(&result.fragment.nodes), @r###"
    if
      branch a
        <p> Element
          text "A"
      branch b
        <p> Element
          text "B"
      branch else
        <i> Element
        <b> Element
    comment " kept "
    <span> Element
    "###);
}

#[test]
fn test_for_inside_if_on_same_element() {
    let result = parse_template(r#"<li v-for="item in items" v-if="show">{{ item }}</li>"#);
    assert!(result.errors.is_empty());
    insta::assert_snapshot!(outline(&result.fragment.nodes), @r###"
    if
      branch show
        for items
          <li> Element
            {{item}}
    "###);
}

#[test]
fn test_template_for_is_unwrapped() {
    let result = parse_template(r#"<template v-for="(n, i) in list" :key="i"><a/><b/></template>"#);
    let TemplateNode::For(for_node) = &result.fragment.nodes[0] else {
        panic!("expected a for node");
    };
    assert_eq!(for_node.value.as_ref().unwrap().content, "n");
    assert_eq!(for_node.key.as_ref().unwrap().content, "i");
    assert_eq!(for_node.children.len(), 2);
    let span = for_node.alias_span().unwrap();
    assert_eq!((u32::from(span.start), u32::from(span.end)), (18, 22));
}

#[test]
fn test_structural_directives_are_removed() {
    let result = parse_template(r#"<div v-if="ok" class="x"></div>"#);
    let TemplateNode::If(if_node) = &result.fragment.nodes[0] else {
        panic!("expected an if node");
    };
    let TemplateNode::Element(el) = &if_node.branches[0].children[0] else {
        panic!("expected an element");
    };
    assert!(el.directive("if").is_none());
    assert_eq!(el.props.len(), 1);
}

#[test]
fn test_slot_template_keeps_its_directives() {
    let result = parse_template(r#"<Comp><template #item="{ x }" v-if="ok">{{ x }}</template></Comp>"#);
    assert!(result.errors.is_empty());
    let TemplateNode::Element(comp) = &result.fragment.nodes[0] else {
        panic!("expected a component");
    };
    assert_eq!(comp.tag_type, TagType::Component);
    let TemplateNode::Element(slot) = &comp.children[0] else {
        panic!("expected the slot template");
    };
    assert_eq!(slot.tag_type, TagType::Template);
    assert!(slot.directive("slot").is_some());
    assert!(slot.directive("if").is_some());
}

#[test]
fn test_else_without_if_is_reported() {
    let result = parse_template(r#"<p v-else>x</p>"#);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].kind,
        ParseErrorKind::MissingIf { directive: "else" }
    );
    assert!(matches!(result.fragment.nodes[0], TemplateNode::Element(_)));
}

#[test]
fn test_invalid_for_is_reported() {
    let result = parse_template(r#"<p v-for="items">x</p>"#);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0].kind, ParseErrorKind::InvalidFor { .. }));
    let TemplateNode::For(for_node) = &result.fragment.nodes[0] else {
        panic!("expected a for node");
    };
    assert!(for_node.source.is_none());
}

#[test]
fn test_slot_outlet_tag_type() {
    let result = parse_template(r#"<slot name="footer" :item="x" />"#);
    let TemplateNode::Element(el) = &result.fragment.nodes[0] else {
        panic!("expected an element");
    };
    assert_eq!(el.tag_type, TagType::Slot);
}
