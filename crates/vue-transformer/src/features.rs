//! Verification policies attached to generated segments.

use source_map::{CodeInfo, Verification};

/// Mapped for navigation only.
pub const NONE: CodeInfo = CodeInfo::NONE;

/// Every diagnostic reports.
pub const VERIFICATION: CodeInfo = CodeInfo::new(Verification::Always);

/// Unknown property access (TS2339, TS2551) is expected here.
pub const NO_UNKNOWN_PROPERTY: CodeInfo = CodeInfo::new(Verification::Unless(&[2339, 2551]));

/// Excess property checks (TS2353, TS2561) are expected here.
pub const NO_EXCESS_PROPERTY: CodeInfo = CodeInfo::new(Verification::Unless(&[2353, 2561]));

/// Unused declarations (TS6133) are expected here.
pub const NO_UNUSED: CodeInfo = CodeInfo::new(Verification::Unless(&[6133]));

/// Picks the property access policy for a strictness flag.
#[inline]
pub fn unknown_property(strict: bool) -> CodeInfo {
    if strict {
        VERIFICATION
    } else {
        NO_UNKNOWN_PROPERTY
    }
}

/// Picks the object literal policy for a strictness flag.
#[inline]
pub fn excess_property(strict: bool) -> CodeInfo {
    if strict {
        VERIFICATION
    } else {
        NO_EXCESS_PROPERTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        assert!(NO_UNUSED.verification.accepts(2322));
        assert!(!NO_UNUSED.verification.accepts(6133));
        assert!(!NO_EXCESS_PROPERTY.verification.accepts(2561));
        assert!(!NONE.verification.is_enabled());
        assert_eq!(unknown_property(true), VERIFICATION);
        assert_eq!(unknown_property(false), NO_UNKNOWN_PROPERTY);
    }
}
