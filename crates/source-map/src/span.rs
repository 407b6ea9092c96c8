//! Span and byte offset types for source positions.

use text_size::TextSize;

/// Byte offset into a document, a block or the generated text.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)` in a document or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// A zero-length span at `offset`.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Creates a span from `usize` offsets, as produced by `str` searches.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        Self::new(start as u32, end as u32)
    }

    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `end` itself is outside.
    #[inline]
    pub fn contains(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The smallest span containing both.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Moves the span by `delta` bytes, e.g. from block-local to document offsets.
    #[inline]
    pub fn shift(self, delta: u32) -> Span {
        let delta = TextSize::from(delta);
        Span {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// Returns the text covered by this span, or `None` if it is out of bounds.
    pub fn slice(self, text: &str) -> Option<&str> {
        text.get(u32::from(self.start) as usize..u32::from(self.end) as usize)
    }
}
