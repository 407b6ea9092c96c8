//! Scanning of style block contents for template-visible references.
//!
//! Offsets are preserved by blanking ignored regions with spaces before the
//! scan rather than removing them.

use crate::ast::StyleRef;

/// Blanks comment bodies, leaving the delimiters in place.
fn blank_comments(css: &mut [u8]) {
    let mut i = 0;
    while i + 1 < css.len() {
        match (css[i], css[i + 1]) {
            (b'/', b'*') => {
                let body = i + 2;
                let Some(rel) = find(&css[body..], b"*/") else {
                    return;
                };
                fill(&mut css[body..body + rel]);
                i = body + rel + 2;
            }
            (b'/', b'/') => {
                let body = i + 2;
                // Unterminated line comments at the end are left alone.
                let Some(rel) = css[body..].iter().position(|&b| b == b'\n') else {
                    return;
                };
                fill(&mut css[body..body + rel]);
                i = body + rel + 1;
            }
            _ => i += 1,
        }
    }
}

/// Blanks declaration text between a `{` and the last unescaped `;` before
/// the next `{`.
fn blank_declarations(css: &mut [u8]) {
    let mut i = 0;
    while i < css.len() {
        if css[i] != b'{' {
            i += 1;
            continue;
        }
        let body = i + 1;
        let limit = css[body..]
            .iter()
            .position(|&b| b == b'{')
            .map_or(css.len(), |rel| body + rel);
        let semicolon = (body..limit)
            .rev()
            .find(|&j| css[j] == b';' && (j == 0 || css[j - 1] != b'\\'));
        match semicolon {
            Some(end) => {
                fill(&mut css[body..end]);
                i = end + 1;
            }
            None => i = body,
        }
    }
}

fn fill(bytes: &mut [u8]) {
    bytes.fill(b' ');
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Collects `v-bind(name)`, `v-bind('expr')` and `v-bind("expr")` references.
pub fn scan_bindings(css: &str) -> Vec<StyleRef> {
    let mut bytes = css.as_bytes().to_ascii_lowercase();
    blank_comments(&mut bytes);

    let mut found = Vec::new();
    let mut i = 0;
    while let Some(rel) = find(&bytes[i..], b"v-bind(") {
        let start = i + rel;
        i = start + 1;
        if start > 0 && is_word(bytes[start - 1]) {
            continue;
        }
        let mut j = start + "v-bind(".len();
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let (text_start, text_end, after) = match bytes.get(j) {
            Some(&quote @ (b'\'' | b'"')) => {
                let Some(len) = bytes[j + 1..].iter().position(|&b| b == quote) else {
                    continue;
                };
                if len == 0 {
                    continue;
                }
                (j + 1, j + 1 + len, j + 2 + len)
            }
            Some(&b) if b.is_ascii_alphabetic() || b == b'_' => {
                let len = bytes[j..].iter().position(|&b| !is_word(b)).unwrap_or(bytes.len() - j);
                (j, j + len, j + len)
            }
            _ => continue,
        };
        let mut k = after;
        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if bytes.get(k) != Some(&b')') {
            continue;
        }
        found.push(StyleRef {
            text: css[text_start..text_end].to_string(),
            offset: text_start as u32,
        });
        i = k + 1;
    }
    found
}

/// Collects `.class` selectors, including the leading dot.
pub fn scan_class_names(css: &str) -> Vec<StyleRef> {
    let mut bytes = css.as_bytes().to_vec();
    blank_comments(&mut bytes);
    blank_declarations(&mut bytes);

    let mut found = Vec::new();
    for start in 0..bytes.len() {
        if bytes[start] != b'.' {
            continue;
        }
        match bytes.get(start + 1) {
            Some(&b) if b.is_ascii_alphabetic() || b == b'_' => {}
            _ => continue,
        }
        let len = bytes[start + 1..]
            .iter()
            .position(|&b| !(is_word(b) || b == b'-'))
            .unwrap_or(bytes.len() - start - 1);
        let end = start + 1 + len;
        let terminated = bytes.get(end).is_some_and(|&b| {
            b.is_ascii_whitespace() || b".,+~>:#)[{".contains(&b)
        });
        if terminated {
            found.push(StyleRef {
                text: css[start..end].to_string(),
                offset: start as u32,
            });
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(refs: &[StyleRef]) -> Vec<(&str, u32)> {
        refs.iter().map(|r| (r.text.as_str(), r.offset)).collect()
    }

    #[test]
    fn test_scan_bindings() {
        let css = ".a { color: v-bind(color); width: v-bind('size.w'); }";
        assert_eq!(
            texts(&scan_bindings(css)),
            vec![("color", 19), ("size.w", 42)]
        );
    }

    #[test]
    fn test_bindings_in_comments_are_ignored() {
        let css = "/* v-bind(hidden) */\n// v-bind(gone)\n.a { top: v-bind( \"x\" ) }";
        assert_eq!(texts(&scan_bindings(css)), vec![("x", 56)]);
    }

    #[test]
    fn test_scan_class_names() {
        let css = ".foo, .bar-baz:hover { color: red; }\n.qux{}";
        assert_eq!(
            texts(&scan_class_names(css)),
            vec![(".foo", 0), (".bar-baz", 6), (".qux", 37)]
        );
    }

    #[test]
    fn test_class_names_skip_declarations_and_comments() {
        let css = "/* .hidden { } */ .a { background: url(x.png); }";
        assert_eq!(texts(&scan_class_names(css)), vec![(".a", 18)]);
    }
}
