//! Mapping error types.

use thiserror::Error;

/// A defect in a segment stream. These are code generator bugs, not
/// properties of the user's document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A combine group was still open when the stream ended.
    #[error("combine group {token} was never closed")]
    UnterminatedGroup {
        /// The token of the open group.
        token: u32,
    },

    /// A segment joined or closed a group that was never opened.
    #[error("combine group {token} was not opened before use")]
    UnopenedGroup {
        /// The token of the missing group.
        token: u32,
    },

    /// A segment tried to open a group that already exists.
    #[error("combine group {token} was opened twice")]
    ReopenedGroup {
        /// The duplicated token.
        token: u32,
    },

    /// A segment referenced a source missing from the source table.
    #[error("segment references unknown source {source_id}")]
    UnknownSource {
        /// The unknown source index.
        source_id: u32,
    },

    /// Generated offsets went backwards within or across entries.
    #[error("generated offset {offset} is out of order")]
    OutOfOrder {
        /// The offending generated offset.
        offset: u32,
    },
}
