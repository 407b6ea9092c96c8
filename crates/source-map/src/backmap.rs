//! Diagnostic backmapping with verification policies.
//!
//! A diagnostic reported against the generated text is translated by scanning
//! the entries whose segments cover both of its ends, innermost first (smallest
//! covered generated extent, later entries winning ties). The first entry
//! whose policy accepts the diagnostic code decides its document position;
//! rejected entries fall through to enclosing ones, and a diagnostic no entry
//! accepts is dropped.
//!
//! Expect-error frames are resolved in two passes. The first pass counts, per
//! frame, the diagnostics the frame swallowed; the second pass decides every
//! diagnostic with those counts known, so the outcome never depends on the
//! order in which the checker reported diagnostics.

use crate::{Mapping, SourceId, SourceMap, Span, Verification};
use rustc_hash::FxHashMap;

/// A diagnostic as reported against the generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDiagnostic {
    pub code: u32,
    /// Generated byte offset of the first character.
    pub start: u32,
    /// Generated byte offset past the last character.
    pub end: u32,
    pub message: String,
}

/// A diagnostic translated onto the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedDiagnostic {
    pub code: u32,
    /// Document-absolute range.
    pub span: Span,
    /// The block the range came from.
    pub source: SourceId,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    entry: usize,
    span: Span,
}

/// Outcome of evaluating one candidate during a pass.
enum Decision {
    Report,
    Reject,
}

/// Translates generated diagnostics back onto the document.
#[derive(Debug, Clone, Copy)]
pub struct Backmapper<'map> {
    map: &'map SourceMap,
}

impl<'map> Backmapper<'map> {
    pub fn new(map: &'map SourceMap) -> Self {
        Self { map }
    }

    /// Returns the covering entries for a generated range, innermost first.
    fn candidates(&self, start: u32, end: u32) -> Vec<Candidate> {
        let mut found: Vec<(u32, usize, Span)> = self
            .map
            .entries()
            .iter()
            .enumerate()
            .filter_map(|(entry, mapping)| {
                mapping
                    .original_range(start, end)
                    .map(|(span, extent)| (extent, entry, span))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        found
            .into_iter()
            .map(|(_, entry, span)| Candidate { entry, span })
            .collect()
    }

    fn entry(&self, candidate: Candidate) -> &Mapping {
        &self.map.entries()[candidate.entry]
    }

    /// Maps a batch of diagnostics, dropping those no entry accepts.
    ///
    /// The result is sorted by document position.
    pub fn map_diagnostics(&self, diagnostics: &[GeneratedDiagnostic]) -> Vec<MappedDiagnostic> {
        let candidates: Vec<Vec<Candidate>> = diagnostics
            .iter()
            .map(|diagnostic| self.candidates(diagnostic.start, diagnostic.end))
            .collect();

        // Pass 1: count swallowed diagnostics per expect-error frame.
        let mut consumed: FxHashMap<u32, u32> = FxHashMap::default();
        let mut unused_markers: Vec<(u32, u32)> = Vec::new();
        for (diagnostic, candidates) in diagnostics.iter().zip(&candidates) {
            for &candidate in candidates {
                match self.entry(candidate).info.verification {
                    Verification::Expected { frame, unless } => {
                        if !unless.contains(&diagnostic.code) {
                            *consumed.entry(frame).or_default() += 1;
                        }
                    }
                    Verification::UnusedExpectation {
                        frame,
                        outer: Some(outer),
                    } => unused_markers.push((frame, outer)),
                    policy if policy.accepts(diagnostic.code) => break,
                    _ => {}
                }
            }
        }
        // Inner frames carry larger ids; settle them before their parents.
        unused_markers.sort_by(|a, b| b.0.cmp(&a.0));
        for (frame, outer) in unused_markers {
            if consumed.get(&frame).copied().unwrap_or(0) == 0 {
                *consumed.entry(outer).or_default() += 1;
            }
        }

        // Pass 2: decide with final counts.
        let mut mapped = Vec::new();
        for (diagnostic, candidates) in diagnostics.iter().zip(&candidates) {
            let accepted = candidates.iter().copied().find(|&candidate| {
                matches!(
                    self.decide(candidate, diagnostic.code, &consumed),
                    Decision::Report
                )
            });
            match accepted {
                Some(candidate) => mapped.push(MappedDiagnostic {
                    code: diagnostic.code,
                    span: candidate.span,
                    source: self.entry(candidate).source,
                    message: diagnostic.message.clone(),
                }),
                None => tracing::debug!(
                    code = diagnostic.code,
                    start = diagnostic.start,
                    end = diagnostic.end,
                    "dropped diagnostic without an accepting mapping"
                ),
            }
        }

        mapped.sort_by_key(|diagnostic| (diagnostic.span.start, diagnostic.span.end));
        mapped
    }

    fn decide(&self, candidate: Candidate, code: u32, consumed: &FxHashMap<u32, u32>) -> Decision {
        let verification = self.entry(candidate).info.verification;
        let accepted = match verification {
            Verification::UnusedExpectation { frame, outer: None } => {
                consumed.get(&frame).copied().unwrap_or(0) == 0
            }
            policy => policy.accepts(code),
        };
        if accepted {
            Decision::Report
        } else {
            Decision::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodeInfo, Combine, CombineToken, Segment, SourceMapBuilder};
    use pretty_assertions::assert_eq;

    const ALWAYS: CodeInfo = CodeInfo::new(Verification::Always);
    const NO_UNUSED: CodeInfo = CodeInfo::new(Verification::Unless(&[6133]));
    const UNUSED_EXPECT_ERROR: u32 = 2578;

    fn diagnostic(code: u32, start: u32, end: u32) -> GeneratedDiagnostic {
        GeneratedDiagnostic {
            code,
            start,
            end,
            message: format!("TS{code}"),
        }
    }

    fn build(segments: Vec<Segment>) -> SourceMap {
        let mut builder = SourceMapBuilder::new(vec![0]);
        builder.extend(segments);
        builder.finish().unwrap().1
    }

    #[test]
    fn test_policy_suppresses_only_listed_code() {
        // `const __VLS_0 = 1;` where the name maps back under "never 6133".
        let map = build(vec![
            "const ".into(),
            Segment::mapped("__VLS_0", SourceId::DOCUMENT, 10, NO_UNUSED),
            " = ".into(),
            Segment::mapped("1", SourceId::DOCUMENT, 30, ALWAYS),
            ";\n".into(),
        ]);
        let mapper = Backmapper::new(&map);

        let result = mapper.map_diagnostics(&[diagnostic(6133, 6, 13), diagnostic(2322, 6, 13)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].code, 2322);
        assert_eq!(result[0].span, Span::new(10u32, 17u32));
    }

    #[test]
    fn test_unmapped_positions_are_dropped() {
        let map = build(vec!["const a = 1;\n".into()]);
        assert!(Backmapper::new(&map)
            .map_diagnostics(&[diagnostic(2322, 0, 5)])
            .is_empty());
    }

    #[test]
    fn test_rejected_inner_falls_through_to_outer() {
        let token = CombineToken(0);
        let map = build(vec![
            Segment::marker(SourceId::DOCUMENT, 0, ALWAYS.with_combine(Combine::Open(token))),
            Segment::mapped("foo", SourceId::DOCUMENT, 2, CodeInfo::NONE),
            Segment::marker(SourceId::DOCUMENT, 5, CodeInfo::NONE.with_combine(Combine::Close(token))),
        ]);

        // `foo` itself never reports, the enclosing boundary does.
        let result = Backmapper::new(&map).map_diagnostics(&[diagnostic(2322, 0, 3)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].span, Span::new(0u32, 5u32));
    }

    fn expect_error_map(frame_segments: Vec<Segment>) -> SourceMap {
        let token = CombineToken(0);
        let mut segments = frame_segments;
        segments.extend([
            Segment::marker(
                SourceId::DOCUMENT,
                0,
                CodeInfo::new(Verification::UnusedExpectation {
                    frame: 0,
                    outer: None,
                })
                .with_combine(Combine::Open(token)),
            ),
            "// @ts-expect-error".into(),
            Segment::marker(SourceId::DOCUMENT, 26, CodeInfo::NONE.with_combine(Combine::Close(token))),
            "\n;\n".into(),
        ]);
        build(segments)
    }

    #[test]
    fn test_expect_error_swallows_and_silences_marker() {
        let expected = CodeInfo::new(Verification::Expected {
            frame: 0,
            unless: &[],
        });
        let map = expect_error_map(vec![
            Segment::mapped("bad", SourceId::DOCUMENT, 40, expected),
            ";\n".into(),
        ]);
        let marker_start = 5;
        let marker_end = marker_start + "// @ts-expect-error".len() as u32;

        // Reported in reverse order on purpose.
        let result = Backmapper::new(&map).map_diagnostics(&[
            diagnostic(UNUSED_EXPECT_ERROR, marker_start, marker_end),
            diagnostic(2322, 0, 3),
        ]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_expect_error_without_errors_reports_marker() {
        let expected = CodeInfo::new(Verification::Expected {
            frame: 0,
            unless: &[],
        });
        let map = expect_error_map(vec![
            Segment::mapped("fine", SourceId::DOCUMENT, 40, expected),
            ";\n".into(),
        ]);
        let marker_start = 6;
        let marker_end = marker_start + "// @ts-expect-error".len() as u32;

        let result = Backmapper::new(&map)
            .map_diagnostics(&[diagnostic(UNUSED_EXPECT_ERROR, marker_start, marker_end)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].span, Span::new(0u32, 26u32));
    }

    #[test]
    fn test_nested_unused_marker_counts_for_outer_frame() {
        let outer_token = CombineToken(0);
        let inner_token = CombineToken(1);
        let map = build(vec![
            // Inner frame (1) marker, emitted while the outer frame (0) is active.
            Segment::marker(
                SourceId::DOCUMENT,
                10,
                CodeInfo::new(Verification::UnusedExpectation {
                    frame: 1,
                    outer: Some(0),
                })
                .with_combine(Combine::Open(inner_token)),
            ),
            "// @ts-expect-error".into(),
            Segment::marker(SourceId::DOCUMENT, 36, CodeInfo::NONE.with_combine(Combine::Close(inner_token))),
            "\n;\n".into(),
            // Outer frame marker.
            Segment::marker(
                SourceId::DOCUMENT,
                0,
                CodeInfo::new(Verification::UnusedExpectation {
                    frame: 0,
                    outer: None,
                })
                .with_combine(Combine::Open(outer_token)),
            ),
            "// @ts-expect-error".into(),
            Segment::marker(SourceId::DOCUMENT, 9, CodeInfo::NONE.with_combine(Combine::Close(outer_token))),
            "\n;\n".into(),
        ]);
        let len = "// @ts-expect-error".len() as u32;
        let outer_start = len + 3;

        // Only the inner marker fires; the outer frame treats it as its expected error.
        let result = Backmapper::new(&map).map_diagnostics(&[
            diagnostic(UNUSED_EXPECT_ERROR, 0, len),
            diagnostic(UNUSED_EXPECT_ERROR, outer_start, outer_start + len),
        ]);
        assert!(result.is_empty());
    }
}
