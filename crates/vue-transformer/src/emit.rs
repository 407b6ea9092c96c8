//! Segment buffer shared by the code generators.
//!
//! Generators append [`Segment`]s in output order. Combine tokens come from a
//! counter carried by the buffer, so buffers created with
//! [`Codes::continue_from`] never reuse a token of an earlier buffer.

use crate::text;
use source_map::{CodeInfo, Combine, CombineToken, Segment, SourceId, Verification};
use std::borrow::Cow;

/// Source table indices for the blocks of one document.
pub mod source {
    use source_map::SourceId;

    /// Offsets already relative to the whole document.
    pub const MAIN: SourceId = SourceId::DOCUMENT;
    pub const TEMPLATE: SourceId = SourceId(1);
    pub const SCRIPT: SourceId = SourceId(2);
    pub const SCRIPT_SETUP: SourceId = SourceId(3);
    const FIRST_STYLE: u32 = 4;

    /// The `index`-th style block.
    pub const fn style(index: usize) -> SourceId {
        SourceId(FIRST_STYLE + index as u32)
    }

    /// Number of fixed entries before the style blocks.
    pub const FIXED: usize = FIRST_STYLE as usize;
}

/// How verification-enabled segments are rewritten while a directive comment
/// frame is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEffect {
    /// `@vue-ignore`: nothing reports.
    Ignore,
    /// `@vue-expect-error`: errors count towards the frame.
    Expect(u32),
}

/// An open combine group returned by [`Codes::open`].
#[derive(Debug, Clone, Copy)]
#[must_use = "a boundary must be closed"]
pub struct Boundary {
    pub token: CombineToken,
    pub source: SourceId,
}

/// Growable segment list with a combine token counter.
#[derive(Debug, Default)]
pub struct Codes {
    segments: Vec<Segment>,
    next_token: u32,
    effect: Option<FrameEffect>,
}

impl Codes {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer whose tokens follow those handed out by `previous`.
    pub fn continue_from(previous: &Codes) -> Self {
        Self {
            segments: Vec::new(),
            next_token: previous.next_token,
            effect: previous.effect,
        }
    }

    /// Moves the segments of `other` to the end of this buffer.
    pub fn append(&mut self, other: Codes) {
        self.next_token = self.next_token.max(other.next_token);
        self.segments.extend(other.segments);
    }

    /// Appends segments produced elsewhere.
    pub fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) {
        self.segments.extend(segments);
    }

    /// Reserves the tokens used by a buffer that is only rendered as text.
    pub fn absorb_tokens(&mut self, other: &Codes) {
        self.next_token = self.next_token.max(other.next_token);
    }

    pub fn set_effect(&mut self, effect: Option<FrameEffect>) {
        self.effect = effect;
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// The generated text of the buffer.
    pub fn to_text(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }

    /// Text of the last segment, if any.
    pub fn last_text(&self) -> Option<&str> {
        self.segments.last().map(Segment::as_str)
    }

    /// Whether the generated text is empty or ends with a newline.
    pub fn at_line_start(&self) -> bool {
        self.segments
            .iter()
            .rev()
            .map(Segment::as_str)
            .find(|text| !text.is_empty())
            .map_or(true, |text| text.ends_with('\n'))
    }

    /// Unmapped text.
    pub fn text(&mut self, text: impl Into<Cow<'static, str>>) {
        let text = text.into();
        if !text.is_empty() {
            self.segments.push(Segment::Text(text));
        }
    }

    /// Text attributed to `offset` in `source`.
    pub fn mapped(&mut self, text: impl Into<String>, source: SourceId, offset: u32, info: CodeInfo) {
        let info = self.resolve(info);
        self.segments.push(Segment::mapped(text, source, offset, info));
    }

    /// A zero-length segment at `offset`.
    pub fn marker(&mut self, source: SourceId, offset: u32, info: CodeInfo) {
        let info = self.resolve(info);
        self.segments.push(Segment::marker(source, offset, info));
    }

    /// Pushes an already built segment, applying the active frame.
    pub fn push(&mut self, mut segment: Segment) {
        if let Some(info) = segment.info_mut() {
            *info = self.resolve(*info);
        }
        self.segments.push(segment);
    }

    fn next_token(&mut self) -> CombineToken {
        let token = CombineToken(self.next_token);
        self.next_token += 1;
        token
    }

    /// Opens a combine group at `start`; everything up to the matching
    /// [`close`](Self::close) reports against the source range.
    pub fn open(&mut self, source: SourceId, start: u32, info: CodeInfo) -> Boundary {
        let token = self.next_token();
        self.marker(source, start, info.with_combine(Combine::Open(token)));
        Boundary { token, source }
    }

    pub fn close(&mut self, boundary: Boundary, end: u32) {
        self.segments.push(Segment::marker(
            boundary.source,
            end,
            CodeInfo::NONE.with_combine(Combine::Close(boundary.token)),
        ));
    }

    /// Text joined to an open group.
    pub fn joined(&mut self, boundary: Boundary, text: impl Into<String>, offset: u32) {
        self.segments.push(Segment::mapped(
            text,
            boundary.source,
            offset,
            CodeInfo::NONE.with_combine(Combine::Join(boundary.token)),
        ));
    }

    /// `text` wrapped in a group covering `start..end`.
    pub fn bounded(&mut self, source: SourceId, start: u32, end: u32, info: CodeInfo, text: impl Into<Cow<'static, str>>) {
        let boundary = self.open(source, start, info);
        self.text(text);
        self.close(boundary, end);
    }

    /// A quoted property key. With a position, the quotes and key are
    /// grouped so that a diagnostic on the key covers the quotes.
    pub fn string_literal_key(&mut self, code: &str, at: Option<(SourceId, u32, CodeInfo)>) {
        match at {
            None => self.text(format!("\"{code}\"")),
            Some((source, offset, info)) => {
                let boundary = self.open(source, offset, info);
                self.text("\"");
                self.joined(boundary, code, offset);
                self.text("\"");
                self.close(boundary, offset + code.len() as u32);
            }
        }
    }

    /// A static attribute value. Values containing backslashes or newlines are
    /// written as `\u` escapes, which keeps the string literal well formed.
    pub fn unicode(&mut self, code: &str, source: SourceId, offset: u32, info: CodeInfo) {
        if code.contains('\\') || code.contains('\n') {
            self.bounded(source, offset, offset + code.len() as u32, info, text::to_unicode_escapes(code));
        } else {
            self.mapped(code, source, offset, info);
        }
    }

    /// A hyphenated name written camelCase, each part mapped to its source.
    ///
    /// Parts join `group` when given, otherwise a fresh group when there is
    /// more than one part.
    pub fn camelized(&mut self, code: &str, source: SourceId, offset: u32, info: CodeInfo, group: Option<Boundary>) {
        let parts: Vec<(usize, &str)> = code
            .split('-')
            .scan(0usize, |at, part| {
                let start = *at;
                *at += part.len() + 1;
                Some((start, part))
            })
            .filter(|(_, part)| !part.is_empty())
            .collect();

        if let Some(boundary) = group {
            for (start, part) in &parts {
                self.joined(boundary, camel_part(*start, part), offset + *start as u32);
            }
            return;
        }

        match parts.as_slice() {
            [] => {}
            [(start, part)] => {
                self.mapped(camel_part(*start, part), source, offset + *start as u32, info);
            }
            [(first_start, first), rest @ ..] => {
                let token = self.next_token();
                self.mapped(
                    camel_part(*first_start, first),
                    source,
                    offset + *first_start as u32,
                    info.with_combine(Combine::Open(token)),
                );
                let last = rest.len() - 1;
                for (i, (start, part)) in rest.iter().enumerate() {
                    let combine = if i == last { Combine::Close(token) } else { Combine::Join(token) };
                    self.segments.push(Segment::mapped(
                        text::capitalize(part),
                        source,
                        offset + *start as u32,
                        CodeInfo::NONE.with_combine(combine),
                    ));
                }
            }
        }
    }

    /// One operand as is, several as an object spread of all of them.
    pub fn spread_merge(&mut self, operands: &[String]) {
        match operands {
            [] => {}
            [single] => self.text(single.clone()),
            _ => {
                self.text("{\n");
                for operand in operands {
                    self.text(format!("...{operand},\n"));
                }
                self.text("}");
            }
        }
    }

    /// Replaces the source text `start..end` of `source` with `replacement`
    /// inside the first mapped segment covering it. An empty range inserts.
    /// Returns false when no segment covers the range.
    pub fn replace_source_range(&mut self, source: SourceId, start: u32, end: u32, replacement: &str) -> bool {
        let found = self.segments.iter().enumerate().find_map(|(index, segment)| match segment {
            Segment::Mapped(mapped)
                if mapped.source == source
                    && !mapped.text.is_empty()
                    && mapped.offset <= start
                    && end <= mapped.offset + mapped.text.len() as u32 =>
            {
                Some((index, mapped.clone()))
            }
            _ => None,
        });
        let Some((index, mapped)) = found else {
            return false;
        };

        let head = (start - mapped.offset) as usize;
        let tail = (end - mapped.offset) as usize;
        if !mapped.text.is_char_boundary(head) || !mapped.text.is_char_boundary(tail) {
            return false;
        }
        let mut replaced = Vec::with_capacity(3);
        if head > 0 {
            replaced.push(Segment::mapped(&mapped.text[..head], source, mapped.offset, mapped.info));
        }
        if !replacement.is_empty() {
            replaced.push(Segment::from(replacement.to_string()));
        }
        if tail < mapped.text.len() {
            replaced.push(Segment::mapped(&mapped.text[tail..], source, end, mapped.info));
        }
        self.segments.splice(index..=index, replaced);
        true
    }

    /// Applies the active frame to a verification policy.
    fn resolve(&self, mut info: CodeInfo) -> CodeInfo {
        let Some(effect) = self.effect else {
            return info;
        };
        info.verification = match (effect, info.verification) {
            (_, Verification::Never) => Verification::Never,
            (FrameEffect::Ignore, _) => Verification::Never,
            (FrameEffect::Expect(frame), Verification::Always) => Verification::Expected { frame, unless: &[] },
            (FrameEffect::Expect(frame), Verification::Unless(unless)) => Verification::Expected { frame, unless },
            (FrameEffect::Expect(frame), Verification::UnusedExpectation { frame: inner, outer: None }) if inner != frame => {
                Verification::UnusedExpectation {
                    frame: inner,
                    outer: Some(frame),
                }
            }
            (FrameEffect::Expect(_), verification) => verification,
        };
        info
    }
}

/// Every part but the leading one is capitalized.
fn camel_part(start: usize, part: &str) -> String {
    if start == 0 {
        part.to_string()
    } else {
        text::capitalize(part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features;
    use pretty_assertions::assert_eq;
    use source_map::SourceMapBuilder;

    fn finish(codes: Codes) -> (String, source_map::SourceMap) {
        let mut builder = SourceMapBuilder::new(vec![0, 0]);
        builder.extend(codes.into_segments());
        builder.finish().unwrap()
    }

    #[test]
    fn test_string_literal_key_groups_quotes() {
        let mut codes = Codes::new();
        codes.string_literal_key("foo", Some((source::TEMPLATE, 10, features::VERIFICATION)));
        let (text, map) = finish(codes);
        assert_eq!(text, "\"foo\"");
        assert_eq!(map.len(), 1);
        let entry = map.mappings().next().unwrap();
        assert_eq!(entry.source_offsets, vec![10, 10, 13]);
        assert_eq!(entry.generated_offsets, vec![0, 1, 5]);
    }

    #[test]
    fn test_camelized_parts_share_a_group() {
        let mut codes = Codes::new();
        codes.camelized("foo-bar-baz", source::TEMPLATE, 4, features::VERIFICATION, None);
        let (text, map) = finish(codes);
        assert_eq!(text, "fooBarBaz");
        let entry = map.mappings().next().unwrap();
        assert_eq!(entry.source_offsets, vec![4, 8, 12]);
        assert_eq!(entry.lengths, vec![3, 3, 3]);
    }

    #[test]
    fn test_unicode_escapes_only_when_needed() {
        let mut codes = Codes::new();
        codes.unicode("plain", source::TEMPLATE, 0, features::VERIFICATION);
        codes.unicode("a\\b", source::TEMPLATE, 0, features::VERIFICATION);
        assert_eq!(codes.to_text(), "plain\\u0061\\u005c\\u0062");
    }

    #[test]
    fn test_spread_merge() {
        let mut codes = Codes::new();
        codes.spread_merge(&["a".to_string()]);
        codes.text(" ");
        codes.spread_merge(&["a".to_string(), "b".to_string()]);
        assert_eq!(codes.to_text(), "a {\n...a,\n...b,\n}");
    }

    #[test]
    fn test_frame_effects() {
        let mut codes = Codes::new();
        codes.set_effect(Some(FrameEffect::Ignore));
        codes.mapped("a", source::TEMPLATE, 0, features::VERIFICATION);
        codes.set_effect(Some(FrameEffect::Expect(3)));
        codes.mapped("b", source::TEMPLATE, 1, features::NO_UNUSED);
        codes.mapped("c", source::TEMPLATE, 2, features::NONE);
        let infos: Vec<_> = codes
            .segments()
            .iter()
            .map(|segment| segment.info().unwrap().verification)
            .collect();
        assert_eq!(
            infos,
            vec![
                Verification::Never,
                Verification::Expected {
                    frame: 3,
                    unless: &[6133]
                },
                Verification::Never,
            ]
        );
    }

    #[test]
    fn test_replace_source_range() {
        let mut codes = Codes::new();
        codes.mapped("(a: T) => {}", source::TEMPLATE, 9, features::VERIFICATION);
        assert!(codes.replace_source_range(source::TEMPLATE, 9, 10, ""));
        assert!(codes.replace_source_range(source::TEMPLATE, 11, 11, "/* "));
        assert!(!codes.replace_source_range(source::SCRIPT, 0, 1, ""));
        assert_eq!(codes.to_text(), "a/* : T) => {}");
        let offsets: Vec<_> = codes
            .segments()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Mapped(mapped) => Some(mapped.offset),
                Segment::Text(_) => None,
            })
            .collect();
        assert_eq!(offsets, vec![10, 11]);
    }

    #[test]
    fn test_continued_buffers_do_not_reuse_tokens() {
        let mut first = Codes::new();
        let boundary = first.open(source::TEMPLATE, 0, features::VERIFICATION);
        first.close(boundary, 1);
        let mut second = Codes::continue_from(&first);
        let other = second.open(source::TEMPLATE, 0, features::VERIFICATION);
        assert_ne!(boundary.token, other.token);
        second.close(other, 1);
        first.append(second);
        assert!(finish(first).1.verify(0).is_ok());
    }
}
