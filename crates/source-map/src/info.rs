//! Per-segment verification policy and combine-token grouping.

/// Identifier of a combine group.
///
/// Tokens are handed out by the code generator from a monotonic counter, so the
/// first segment carrying a token always opens its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombineToken(pub u32);

/// The role a segment plays in its combine group.
///
/// All segments of one group fold into a single [`Mapping`](crate::Mapping)
/// entry, which lets one source span correspond to several disjoint generated
/// spans (typically a zero-length start marker and its matching end marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// First segment of the group; its [`CodeInfo`] becomes the entry's policy.
    Open(CombineToken),
    /// An inner segment of an open group.
    Join(CombineToken),
    /// The last segment of the group.
    Close(CombineToken),
}

impl Combine {
    #[inline]
    pub fn token(self) -> CombineToken {
        match self {
            Combine::Open(token) | Combine::Join(token) | Combine::Close(token) => token,
        }
    }
}

/// Whether a diagnostic code reported inside a segment may surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verification {
    /// Mapped for navigation only; diagnostics never surface here.
    #[default]
    Never,
    /// Every diagnostic surfaces.
    Always,
    /// Diagnostics surface unless their code is in the list.
    Unless(&'static [u32]),
    /// Emitted under an `@vue-expect-error` frame. Never reports; a code the
    /// inner policy (`Unless(unless)`) would have reported counts as one
    /// expected error for `frame`.
    Expected {
        frame: u32,
        unless: &'static [u32],
    },
    /// The marker emitted for an `@vue-expect-error` directive itself. It
    /// reports only when `frame` consumed no error. Inside an enclosing
    /// expect-error frame `outer`, an unused marker counts for `outer` instead.
    UnusedExpectation { frame: u32, outer: Option<u32> },
}

impl Verification {
    /// Returns true unless verification is disabled outright.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Verification::Never)
    }

    /// Evaluates the frame-independent part of the policy.
    ///
    /// Frame-dependent variants answer `false`; the [`Backmapper`](crate::Backmapper)
    /// resolves them once all diagnostics of a file are known.
    pub fn accepts(&self, code: u32) -> bool {
        match self {
            Verification::Always => true,
            Verification::Unless(codes) => !codes.contains(&code),
            Verification::Never
            | Verification::Expected { .. }
            | Verification::UnusedExpectation { .. } => false,
        }
    }
}

/// Information attached to a mapped segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeInfo {
    pub verification: Verification,
    pub combine: Option<Combine>,
}

impl CodeInfo {
    /// Mapping without verification.
    pub const NONE: CodeInfo = CodeInfo::new(Verification::Never);

    pub const fn new(verification: Verification) -> Self {
        Self {
            verification,
            combine: None,
        }
    }

    /// Returns a copy of this info taking part in a combine group.
    #[inline]
    pub const fn with_combine(self, combine: Combine) -> Self {
        Self {
            verification: self.verification,
            combine: Some(combine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unless_policy() {
        let policy = Verification::Unless(&[2339, 2551]);
        assert!(policy.accepts(2322));
        assert!(!policy.accepts(2339));
        assert!(!policy.accepts(2551));
        assert!(policy.is_enabled());
    }

    #[test]
    fn test_frame_policies_defer() {
        let expected = Verification::Expected {
            frame: 0,
            unless: &[],
        };
        assert!(!expected.accepts(2322));
        assert!(expected.is_enabled());
        assert!(!Verification::Never.is_enabled());
    }

    #[test]
    fn test_combine_token() {
        let token = CombineToken(7);
        assert_eq!(Combine::Close(token).token(), token);
        let info = CodeInfo::NONE.with_combine(Combine::Open(token));
        assert_eq!(info.combine, Some(Combine::Open(token)));
        assert_eq!(info.verification, Verification::Never);
    }
}
