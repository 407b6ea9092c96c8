//! Source position tracking and mapping for vue-check-rs.
//!
//! Code generators emit a flat stream of [`Segment`]s: plain text, or text
//! attributed to an offset in one of the source blocks together with a
//! [`CodeInfo`] describing whether diagnostics at that position may surface.
//! [`SourceMapBuilder`] concatenates the stream into the generated text and a
//! [`SourceMap`]; [`Backmapper`] later translates diagnostics reported against
//! the generated text back onto the original document.
//!
//! # Example
//!
//! ```
//! use source_map::{CodeInfo, Segment, SourceId, SourceMapBuilder, Verification};
//!
//! let mut builder = SourceMapBuilder::new(vec![0]);
//! builder.push("(");
//! builder.push(Segment::mapped("count", SourceId::DOCUMENT, 12, CodeInfo::new(Verification::Always)));
//! builder.push(");\n");
//!
//! let (code, map) = builder.finish().unwrap();
//! assert_eq!(code, "(count);\n");
//! assert_eq!(map.original_range(1, 6).map(|span| u32::from(span.start)), Some(12));
//! ```

mod backmap;
mod builder;
mod error;
mod info;
mod line_index;
mod segment;
mod span;

pub use backmap::{Backmapper, GeneratedDiagnostic, MappedDiagnostic};
pub use builder::{Mapping, SourceMap, SourceMapBuilder};
pub use error::MappingError;
pub use info::{CodeInfo, Combine, CombineToken, Verification};
pub use line_index::{LineCol, LineIndex};
pub use segment::{MappedSegment, Segment, SourceId};
pub use span::{ByteOffset, Span};
