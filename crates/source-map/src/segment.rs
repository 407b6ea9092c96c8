//! Segments: the unit of code generator output.

use crate::CodeInfo;
use std::borrow::Cow;

/// Index of a source block in the table handed to
/// [`SourceMapBuilder::new`](crate::SourceMapBuilder::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SourceId(pub u32);

impl SourceId {
    /// The whole document; offsets attributed to it are already absolute.
    pub const DOCUMENT: SourceId = SourceId(0);
}

/// Generated text attributed to an offset in a source block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSegment {
    pub text: String,
    pub source: SourceId,
    /// Block-local offset of the first byte of `text`.
    pub offset: u32,
    pub info: CodeInfo,
}

/// One piece of generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Synthetic text with no source position.
    Text(Cow<'static, str>),
    /// Text copied from, or standing for, a source position.
    Mapped(MappedSegment),
}

impl Segment {
    pub fn mapped(text: impl Into<String>, source: SourceId, offset: u32, info: CodeInfo) -> Self {
        Segment::Mapped(MappedSegment {
            text: text.into(),
            source,
            offset,
            info,
        })
    }

    /// A zero-length mapped segment, used as a position anchor.
    pub fn marker(source: SourceId, offset: u32, info: CodeInfo) -> Self {
        Self::mapped(String::new(), source, offset, info)
    }

    /// Returns the generated text of this segment.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Text(text) => text,
            Segment::Mapped(mapped) => &mapped.text,
        }
    }

    /// Returns the length of the generated text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Returns the attached info for mapped segments.
    pub fn info(&self) -> Option<&CodeInfo> {
        match self {
            Segment::Text(_) => None,
            Segment::Mapped(mapped) => Some(&mapped.info),
        }
    }

    /// Returns the attached info mutably for mapped segments.
    pub fn info_mut(&mut self) -> Option<&mut CodeInfo> {
        match self {
            Segment::Text(_) => None,
            Segment::Mapped(mapped) => Some(&mut mapped.info),
        }
    }
}

impl From<&'static str> for Segment {
    fn from(text: &'static str) -> Self {
        Segment::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::Text(Cow::Owned(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Verification;

    #[test]
    fn test_segment_text() {
        let plain = Segment::from("const ");
        assert_eq!(plain.as_str(), "const ");
        assert!(plain.info().is_none());

        let owned = Segment::from(format!("__VLS_{}", 3));
        assert_eq!(owned.len(), 7);
    }

    #[test]
    fn test_marker_is_empty() {
        let marker = Segment::marker(SourceId(2), 40, CodeInfo::new(Verification::Always));
        assert!(marker.is_empty());
        assert_eq!(
            marker.info().map(|info| info.verification),
            Some(Verification::Always)
        );
    }
}
