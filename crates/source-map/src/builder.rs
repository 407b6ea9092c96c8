//! Source map builder: concatenates segments and folds combine groups.

use crate::{ByteOffset, CodeInfo, Combine, CombineToken, MappingError, Segment, SourceId, Span};
use rustc_hash::FxHashMap;
use text_size::TextSize;

/// A mapping entry: parallel offset arrays sharing one [`CodeInfo`].
///
/// Entries created from a single segment hold one element per array; a folded
/// combine group holds one element per segment of the group. Source offsets are
/// document-absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub source: SourceId,
    pub source_offsets: Vec<u32>,
    pub generated_offsets: Vec<u32>,
    pub lengths: Vec<u32>,
    pub info: CodeInfo,
}

impl Mapping {
    fn single(source: SourceId, source_offset: u32, generated_offset: u32, len: u32, info: CodeInfo) -> Self {
        Self {
            source,
            source_offsets: vec![source_offset],
            generated_offsets: vec![generated_offset],
            lengths: vec![len],
            info,
        }
    }

    /// Iterates `(source_offset, generated_offset, length)` triples.
    pub fn segments(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.source_offsets
            .iter()
            .zip(&self.generated_offsets)
            .zip(&self.lengths)
            .map(|((&source, &generated), &len)| (source, generated, len))
    }

    /// Returns the generated range spanned by all segments of this entry.
    pub fn generated_span(&self) -> Span {
        let start = self.generated_offsets.first().copied().unwrap_or(0);
        let end = self
            .segments()
            .map(|(_, generated, len)| generated + len)
            .max()
            .unwrap_or(start);
        Span::new(start, end)
    }

    /// Maps a generated range onto the source when both ends fall inside
    /// segments of this entry. Segment ends are inclusive, so zero-length
    /// markers match exactly their own position.
    pub fn original_range(&self, start: u32, end: u32) -> Option<(Span, u32)> {
        for (source_start, generated_start, len_start) in self.segments() {
            if !(generated_start <= start && start <= generated_start + len_start) {
                continue;
            }
            let mapped_start = source_start + (start - generated_start);
            for (source_end, generated_end, len_end) in self.segments() {
                if !(generated_end <= end && end <= generated_end + len_end) {
                    continue;
                }
                let mapped_end = source_end + (end - generated_end);
                if mapped_end >= mapped_start {
                    let extent = (generated_end + len_end).saturating_sub(generated_start);
                    return Some((Span::new(mapped_start, mapped_end), extent));
                }
            }
        }
        None
    }
}

/// Offset correspondence between a generated text and its document.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    /// Entries in emission order of their first segment.
    mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    pub(crate) fn entries(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Maps a generated range to the document, ignoring verification policy.
    ///
    /// The innermost covering entry wins.
    pub fn original_range(&self, start: u32, end: u32) -> Option<Span> {
        self.mappings
            .iter()
            .enumerate()
            .filter_map(|(index, mapping)| {
                mapping
                    .original_range(start, end)
                    .map(|(span, extent)| (extent, std::cmp::Reverse(index), span))
            })
            .min_by_key(|(extent, index, _)| (*extent, *index))
            .map(|(_, _, span)| span)
    }

    /// Finds the generated position of a document offset.
    ///
    /// Returns the first segment in emission order whose source range covers
    /// the offset.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        let original = u32::from(original);
        self.mappings
            .iter()
            .flat_map(Mapping::segments)
            .find(|&(source, _, len)| source <= original && original <= source + len)
            .map(|(source, generated, _)| TextSize::from(generated + (original - source)))
    }

    /// Checks that generated offsets never go backwards and stay inside a
    /// generated text of `generated_len` bytes.
    pub fn verify(&self, generated_len: u32) -> Result<(), MappingError> {
        let mut previous_first = 0;
        for mapping in &self.mappings {
            let first = mapping.generated_offsets.first().copied().unwrap_or(previous_first);
            if first < previous_first {
                return Err(MappingError::OutOfOrder { offset: first });
            }
            previous_first = first;

            let mut previous = first;
            for (_, generated, len) in mapping.segments() {
                if generated < previous || generated + len > generated_len {
                    return Err(MappingError::OutOfOrder { offset: generated });
                }
                previous = generated;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Group {
    entry: usize,
    open: bool,
}

/// Concatenates a segment stream into generated text plus a [`SourceMap`].
#[derive(Debug)]
pub struct SourceMapBuilder {
    code: String,
    mappings: Vec<Mapping>,
    groups: FxHashMap<CombineToken, Group>,
    /// Document offset of each source block's first byte.
    source_bases: Vec<u32>,
    error: Option<MappingError>,
}

impl SourceMapBuilder {
    /// Creates a builder; `source_bases[i]` is the document offset where
    /// [`SourceId`] `i` starts.
    pub fn new(source_bases: Vec<u32>) -> Self {
        Self {
            code: String::new(),
            mappings: Vec::new(),
            groups: FxHashMap::default(),
            source_bases,
            error: None,
        }
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        TextSize::from(self.code.len() as u32)
    }

    /// Appends one segment.
    ///
    /// The first stream defect is remembered and reported by [`finish`](Self::finish).
    pub fn push(&mut self, segment: impl Into<Segment>) {
        match segment.into() {
            Segment::Text(text) => self.code.push_str(&text),
            Segment::Mapped(mapped) => {
                let generated = self.code.len() as u32;
                let len = mapped.text.len() as u32;
                self.code.push_str(&mapped.text);

                let Some(&base) = self.source_bases.get(mapped.source.0 as usize) else {
                    self.fail(MappingError::UnknownSource {
                        source_id: mapped.source.0,
                    });
                    return;
                };
                let source = base + mapped.offset;
                self.add_mapping(mapped.source, source, generated, len, mapped.info);
            }
        }
    }

    /// Appends unmapped text.
    #[inline]
    pub fn push_str(&mut self, text: &str) {
        self.code.push_str(text);
    }

    /// Appends every segment of a stream.
    pub fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) {
        for segment in segments {
            self.push(segment);
        }
    }

    fn add_mapping(&mut self, source_id: SourceId, source: u32, generated: u32, len: u32, info: CodeInfo) {
        let Some(combine) = info.combine else {
            self.mappings
                .push(Mapping::single(source_id, source, generated, len, info));
            return;
        };

        let token = combine.token();
        match (combine, self.groups.get(&token).copied()) {
            (Combine::Open(_), None) => {
                self.groups.insert(
                    token,
                    Group {
                        entry: self.mappings.len(),
                        open: true,
                    },
                );
                self.mappings
                    .push(Mapping::single(source_id, source, generated, len, info));
            }
            (Combine::Open(_), Some(_)) => self.fail(MappingError::ReopenedGroup { token: token.0 }),
            (Combine::Join(_) | Combine::Close(_), Some(group)) if group.open => {
                let entry = &mut self.mappings[group.entry];
                entry.source_offsets.push(source);
                entry.generated_offsets.push(generated);
                entry.lengths.push(len);
                if matches!(combine, Combine::Close(_)) {
                    self.groups.insert(token, Group { open: false, ..group });
                }
            }
            (Combine::Join(_) | Combine::Close(_), _) => {
                self.fail(MappingError::UnopenedGroup { token: token.0 })
            }
        }
    }

    fn fail(&mut self, error: MappingError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Finishes the stream, returning the generated text and its map.
    ///
    /// Fails on the first stream defect, including a group left open.
    pub fn finish(self) -> Result<(String, SourceMap), MappingError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(token) = self
            .groups
            .iter()
            .filter(|(_, group)| group.open)
            .map(|(token, _)| *token)
            .min()
        {
            return Err(MappingError::UnterminatedGroup { token: token.0 });
        }

        tracing::trace!(
            generated_len = self.code.len(),
            mappings = self.mappings.len(),
            "source map built"
        );
        Ok((
            self.code,
            SourceMap {
                mappings: self.mappings,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Verification;
    use pretty_assertions::assert_eq;

    const ALWAYS: CodeInfo = CodeInfo::new(Verification::Always);

    fn boundary(builder: &mut SourceMapBuilder, token: u32, start: u32, end: u32, inner: &'static str) {
        let token = CombineToken(token);
        builder.push(Segment::marker(
            SourceId::DOCUMENT,
            start,
            ALWAYS.with_combine(Combine::Open(token)),
        ));
        builder.push(inner);
        builder.push(Segment::marker(
            SourceId::DOCUMENT,
            end,
            CodeInfo::NONE.with_combine(Combine::Close(token)),
        ));
    }

    #[test]
    fn test_push_str_is_unmapped() {
        let mut builder = SourceMapBuilder::new(vec![0, 10]);
        builder.push_str("let ");
        builder.push(Segment::mapped("a", SourceId(1), 0, ALWAYS));
        builder.push_str(";\n");
        let (code, map) = builder.finish().unwrap();

        assert_eq!(code, "let a;\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.original_range(0, 3), None);
        assert_eq!(map.original_range(4, 5), Some(Span::new(10u32, 11u32)));
    }

    #[test]
    fn test_generated_length_matches_segments() {
        let segments: Vec<Segment> = vec![
            "const ".into(),
            Segment::mapped("msg", SourceId(1), 4, ALWAYS),
            " = 1;\n".into(),
        ];
        let expected_len: usize = segments.iter().map(Segment::len).sum();

        let mut builder = SourceMapBuilder::new(vec![0, 100]);
        builder.extend(segments);
        let (code, map) = builder.finish().unwrap();

        assert_eq!(code.len(), expected_len);
        assert_eq!(code, "const msg = 1;\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.original_range(6, 9), Some(Span::new(104u32, 107u32)));
        assert_eq!(map.verify(code.len() as u32), Ok(()));
    }

    #[test]
    fn test_combine_group_folds_into_first_entry() {
        let mut builder = SourceMapBuilder::new(vec![0]);
        builder.push("x(");
        boundary(&mut builder, 0, 10, 20, "{ a: 1 }");
        builder.push(");\n");
        let (code, map) = builder.finish().unwrap();

        assert_eq!(code, "x({ a: 1 });\n");
        let entries: Vec<_> = map.mappings().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_offsets, vec![10, 20]);
        assert_eq!(entries[0].generated_offsets, vec![2, 10]);
        assert_eq!(entries[0].lengths, vec![0, 0]);
        assert_eq!(entries[0].info.verification, Verification::Always);

        // The whole object literal maps onto the whole source span.
        assert_eq!(map.original_range(2, 10), Some(Span::new(10u32, 20u32)));
        // A range strictly inside the group has no counterpart.
        assert_eq!(map.original_range(3, 5), None);
    }

    #[test]
    fn test_unterminated_group_is_fatal() {
        let mut builder = SourceMapBuilder::new(vec![0]);
        builder.push(Segment::marker(
            SourceId::DOCUMENT,
            0,
            ALWAYS.with_combine(Combine::Open(CombineToken(3))),
        ));
        builder.push("dangling");
        assert_eq!(
            builder.finish().unwrap_err(),
            MappingError::UnterminatedGroup { token: 3 }
        );
    }

    #[test]
    fn test_close_without_open_is_fatal() {
        let mut builder = SourceMapBuilder::new(vec![0]);
        builder.push(Segment::marker(
            SourceId::DOCUMENT,
            0,
            CodeInfo::NONE.with_combine(Combine::Close(CombineToken(1))),
        ));
        assert_eq!(
            builder.finish().unwrap_err(),
            MappingError::UnopenedGroup { token: 1 }
        );
    }

    #[test]
    fn test_unknown_source() {
        let mut builder = SourceMapBuilder::new(vec![0]);
        builder.push(Segment::mapped("a", SourceId(5), 0, ALWAYS));
        assert_eq!(
            builder.finish().unwrap_err(),
            MappingError::UnknownSource { source_id: 5 }
        );
    }

    #[test]
    fn test_innermost_entry_wins() {
        let mut builder = SourceMapBuilder::new(vec![0]);
        boundary(&mut builder, 0, 0, 30, "");
        builder.push(Segment::mapped("foo", SourceId::DOCUMENT, 40, ALWAYS));
        boundary(&mut builder, 1, 50, 60, "");
        let (_, map) = builder.finish().unwrap();

        // Position 0 is covered by the first group's markers and the start of `foo`.
        assert_eq!(map.original_range(0, 3), Some(Span::new(40u32, 43u32)));
        // The zero-length marker is narrower than `foo`.
        assert_eq!(map.original_range(0, 0), Some(Span::new(0u32, 0u32)));
    }

    #[test]
    fn test_later_entry_wins_a_tie() {
        let mut builder = SourceMapBuilder::new(vec![0]);
        boundary(&mut builder, 0, 0, 30, "");
        boundary(&mut builder, 1, 50, 60, "");
        let (_, map) = builder.finish().unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.original_range(0, 0), Some(Span::new(50u32, 50u32)));
    }

    #[test]
    fn test_generated_position() {
        let mut builder = SourceMapBuilder::new(vec![0, 10]);
        builder.push("let ");
        builder.push(Segment::mapped("hello", SourceId(1), 0, ALWAYS));
        let (_, map) = builder.finish().unwrap();

        assert_eq!(
            map.generated_position(TextSize::from(12)),
            Some(TextSize::from(6))
        );
        assert_eq!(map.generated_position(TextSize::from(2)), None);
    }
}
