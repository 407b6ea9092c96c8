//! Transformation error types.

use miette::Diagnostic;
use source_map::MappingError;
use thiserror::Error;

/// An error that stops the transformation of a document.
///
/// Malformed templates and scripts never end up here; they degrade to fewer
/// checked expressions. What remains are defects of the generated stream.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformError {
    /// The segment stream could not be turned into a source map.
    #[error("failed to build the source map: {0}")]
    #[diagnostic(
        code(vue_transformer::mapping),
        help("this is a code generator bug; please report it with the component source")
    )]
    Mapping(#[from] MappingError),

    /// Options could not be read.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Options(#[from] OptionsError),
}

/// An error reading compiler options.
#[derive(Debug, Error, Diagnostic)]
pub enum OptionsError {
    #[error("invalid compiler options: {0}")]
    #[diagnostic(code(vue_transformer::options))]
    Json(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TransformError::from(MappingError::UnterminatedGroup { token: 2 });
        assert_eq!(
            error.to_string(),
            "failed to build the source map: combine group 2 was never closed"
        );
        assert_eq!(
            error.code().map(|code| code.to_string()).as_deref(),
            Some("vue_transformer::mapping")
        );
    }
}
