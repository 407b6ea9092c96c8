//! Tag classification tables.

const HTML_TAGS: &[&str] = &[
    "html", "body", "base", "head", "link", "meta", "style", "title", "address", "article",
    "aside", "footer", "header", "hgroup", "h1", "h2", "h3", "h4", "h5", "h6", "nav", "section",
    "div", "dd", "dl", "dt", "figcaption", "figure", "picture", "hr", "img", "li", "main", "ol",
    "p", "pre", "ul", "a", "b", "abbr", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em",
    "i", "kbd", "mark", "q", "rp", "rt", "ruby", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr", "area", "audio", "map", "track", "video", "embed", "object",
    "param", "source", "canvas", "script", "noscript", "del", "ins", "caption", "col", "colgroup",
    "table", "thead", "tbody", "td", "th", "tr", "button", "datalist", "fieldset", "form",
    "input", "label", "legend", "meter", "optgroup", "option", "output", "progress", "select",
    "textarea", "details", "dialog", "menu", "summary", "template", "blockquote", "iframe",
    "tfoot", "search",
];

const SVG_TAGS: &[&str] = &[
    "svg", "animate", "animateMotion", "animateTransform", "circle", "clipPath", "color-profile",
    "defs", "desc", "discard", "ellipse", "feBlend", "feColorMatrix", "feComponentTransfer",
    "feComposite", "feConvolveMatrix", "feDiffuseLighting", "feDisplacementMap",
    "feDistantLight", "feDropShadow", "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR",
    "feGaussianBlur", "feImage", "feMerge", "feMergeNode", "feMorphology", "feOffset",
    "fePointLight", "feSpecularLighting", "feSpotLight", "feTile", "feTurbulence", "filter",
    "foreignObject", "g", "hatch", "hatchpath", "image", "line", "linearGradient", "marker",
    "mask", "mesh", "meshgradient", "meshpatch", "meshrow", "metadata", "mpath", "path",
    "pattern", "polygon", "polyline", "radialGradient", "rect", "set", "solidcolor", "stop",
    "switch", "symbol", "text", "textPath", "tspan", "unknown", "use", "view",
];

const MATH_TAGS: &[&str] = &[
    "annotation", "annotation-xml", "maction", "maligngroup", "malignmark", "math", "menclose",
    "merror", "mfenced", "mfrac", "mfraction", "mglyph", "mi", "mlabeledtr", "mlongdiv",
    "mmultiscripts", "mn", "mo", "mover", "mpadded", "mphantom", "mprescripts", "mroot", "mrow",
    "ms", "mscarries", "mscarry", "msgroup", "msline", "mspace", "msqrt", "msrow", "mstack",
    "mstyle", "msub", "msubsup", "msup", "mtable", "mtd", "mtext", "mtr", "munder", "munderover",
    "none", "semantics",
];

/// HTML void elements that never have children or closing tags.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Directives that make a `<template>` structural.
const TEMPLATE_DIRECTIVES: &[&str] = &["if", "else", "else-if", "for", "slot"];

pub(crate) fn is_native_tag(tag: &str) -> bool {
    HTML_TAGS.contains(&tag) || SVG_TAGS.contains(&tag) || MATH_TAGS.contains(&tag)
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

pub(crate) fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.iter().any(|raw| raw.eq_ignore_ascii_case(tag))
}

pub(crate) fn is_template_directive(name: &str) -> bool {
    TEMPLATE_DIRECTIVES.contains(&name)
}

/// Returns true if the tag refers to a component rather than a native element.
pub(crate) fn is_component_tag(tag: &str, is_attr: Option<&str>) -> bool {
    if tag == "component" || tag.starts_with(|c: char| c.is_ascii_uppercase()) {
        return true;
    }
    if !is_native_tag(tag) {
        return true;
    }
    is_attr.is_some_and(|value| value.starts_with("vue:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_tags() {
        assert!(is_component_tag("MyButton", None));
        assert!(is_component_tag("my-button", None));
        assert!(is_component_tag("component", None));
        assert!(is_component_tag("Transition", None));
        assert!(!is_component_tag("div", None));
        assert!(!is_component_tag("clipPath", None));
        assert!(is_component_tag("tr", Some("vue:my-row")));
    }

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("br"));
        assert!(is_void_tag("IMG"));
        assert!(!is_void_tag("div"));
    }
}
