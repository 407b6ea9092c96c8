//! Identifier casing and small string helpers.

/// Returns true when `text` is a plain identifier (`[A-Za-z_$][\w$]*`).
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[inline]
fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `foo-bar` to `fooBar`. A hyphen followed by a word character is removed
/// and the character upper-cased.
pub fn camelize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && is_word(next) => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Upper-cases the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `fooBar` and `FooBar` to `foo-bar`.
pub fn hyphenate(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c.is_ascii_uppercase() && prev.is_some_and(is_word) {
            out.push('-');
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}

/// Like [`hyphenate`], but keeps a leading capital visible as a leading
/// hyphen so `Foo` and `foo` stay distinct attribute names.
pub fn hyphenate_attr(text: &str) -> String {
    let hyphenated = hyphenate(text);
    match text.chars().next() {
        Some(first) if first.is_uppercase() => format!("-{hyphenated}"),
        _ => hyphenated,
    }
}

/// Escapes every UTF-16 unit of `text` as `\uXXXX`.
pub fn to_unicode_escapes(text: &str) -> String {
    text.encode_utf16().map(|unit| format!("\\u{unit:04x}")).collect()
}

/// Removes one pair of matching surrounding quotes.
pub fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && matches!(first, b'"' | b'\'' | b'`') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("foo"));
        assert!(is_identifier("$attrs"));
        assert!(is_identifier("_a1"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier("foo-bar"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("foo-bar-baz"), "fooBarBaz");
        assert_eq!(camelize("update:model-value"), "update:modelValue");
        assert_eq!(camelize("foo-1"), "foo1");
        assert_eq!(camelize("trailing-"), "trailing-");
    }

    #[test]
    fn test_hyphenate() {
        assert_eq!(hyphenate("fooBar"), "foo-bar");
        assert_eq!(hyphenate("KeepAlive"), "keep-alive");
        assert_eq!(hyphenate_attr("FooBar"), "-foo-bar");
        assert_eq!(hyphenate_attr("aria-label"), "aria-label");
    }

    #[test]
    fn test_capitalize_and_unicode() {
        assert_eq!(capitalize("myComp"), "MyComp");
        assert_eq!(to_unicode_escapes("a\n"), "\\u0061\\u000a");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("\"x'"), "\"x'");
    }
}
