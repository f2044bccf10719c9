//! Diagnostic codes for categorizing compiler errors and warnings.
//!
//! This module provides the [`DiagnosticCode`] type for uniquely identifying
//! diagnostic messages, enabling users to look up documentation and suppress
//! specific warnings.
//!
//! Lumina's diagnostics are stable short strings (`LUM-001`, `TRY_NOT_RESULT`,
//! `AWAIT_OUTSIDE_ASYNC`, ...) rather than a numbered `{prefix}{number}` scheme,
//! so the code itself is just an interned static string.
//!
//! # Examples
//!
//! ```
//! use lumina_util::diagnostic::DiagnosticCode;
//!
//! let code = DiagnosticCode::LUM_001;
//! assert_eq!(code.as_str(), "LUM-001");
//! ```

/// A unique code identifying a diagnostic message
///
/// # Examples
///
/// ```
/// use lumina_util::diagnostic::DiagnosticCode;
///
/// let code = DiagnosticCode::new("TRY_NOT_RESULT");
/// assert_eq!(code.as_str(), "TRY_NOT_RESULT");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode(&'static str);

impl DiagnosticCode {
    /// Create a new diagnostic code from a stable string.
    #[inline]
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    /// Get the code string (e.g. "LUM-001", "TRY_NOT_RESULT").
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    // =========================================================================
    // GENERAL (LUM-0xx)
    // =========================================================================

    /// LUM-001: Generic type error emitted by the HM inferencer.
    pub const LUM_001: Self = Self::new("LUM-001");
    /// LUM-002: Unresolved name.
    pub const LUM_002: Self = Self::new("LUM-002");
    /// LUM-003: Non-exhaustive match.
    pub const LUM_003: Self = Self::new("LUM-003");
    /// LUM-010: Arity mismatch.
    pub const LUM_010: Self = Self::new("LUM-010");

    // =========================================================================
    // ASYNC / TRY / CONTROL FLOW
    // =========================================================================

    /// `?` applied to a non-`Result` expression.
    pub const TRY_NOT_RESULT: Self = Self::new("TRY_NOT_RESULT");
    /// `?`'s implied early return does not match the enclosing function's return type.
    pub const TRY_RETURN_MISMATCH: Self = Self::new("TRY_RETURN_MISMATCH");
    /// `await` used outside an `async` function.
    pub const AWAIT_OUTSIDE_ASYNC: Self = Self::new("AWAIT_OUTSIDE_ASYNC");

    // =========================================================================
    // RECURSIVE / GENERIC TYPES
    // =========================================================================

    /// A recursive type was formed outside the allowed wrapper set.
    pub const RECURSIVE_TYPE_ERROR: Self = Self::new("RECURSIVE_TYPE_ERROR");
    /// A GADT-style constructor is not supported.
    pub const UNSUPPORTED_GADT: Self = Self::new("UNSUPPORTED_GADT");
    /// A higher-kinded type parameter is not supported.
    pub const UNSUPPORTED_HKT: Self = Self::new("UNSUPPORTED_HKT");

    // =========================================================================
    // TRAITS
    // =========================================================================

    /// TRAIT-004: No implementation found for the required trait.
    pub const TRAIT_004: Self = Self::new("TRAIT-004");
    /// TRAIT-006: Conflicting trait implementations.
    pub const TRAIT_006: Self = Self::new("TRAIT-006");
    /// TRAIT-012: Orphan-rule violation.
    pub const TRAIT_012: Self = Self::new("TRAIT-012");
    /// TRAIT-015: Trait method signature mismatch.
    pub const TRAIT_015: Self = Self::new("TRAIT-015");

    // =========================================================================
    // CONST GENERICS
    // =========================================================================

    /// A const-generic argument's type is not a valid const-expression type.
    pub const CONST_INVALID_TYPE: Self = Self::new("CONST-INVALID-TYPE");
    /// A const-generic parameter was referenced but never bound.
    pub const CONST_UNBOUND_PARAM: Self = Self::new("CONST-UNBOUND-PARAM");
    /// A const expression divides by a statically-known zero.
    pub const CONST_DIV_ZERO: Self = Self::new("CONST-DIV-ZERO");

    // =========================================================================
    // CASTS / INDEXING / STRINGS
    // =========================================================================

    /// A numeric cast may silently lose precision.
    pub const LOSSY_CAST: Self = Self::new("LOSSY-CAST");
    /// A type cast (`as`) is not permitted between these types.
    pub const TYPE_CAST: Self = Self::new("TYPE-CAST");
    /// A string interpolation hole evaluates to `void`/unit.
    pub const STRING_INTERP_VOID: Self = Self::new("STRING_INTERP_VOID");
    /// An index expression does not have an integer type.
    pub const INVALID_INDEX: Self = Self::new("INVALID_INDEX");
    /// A range expression's endpoints have mismatched or invalid types.
    pub const RANGE_TYPE: Self = Self::new("RANGE_TYPE");

    // =========================================================================
    // MACROS / PARSING
    // =========================================================================

    /// A macro invocation did not resolve to a known macro.
    pub const UNRESOLVED_MACRO: Self = Self::new("UNRESOLVED_MACRO");
    /// The parser collaborator reported a syntax error.
    pub const PARSE_ERROR: Self = Self::new("PARSE_ERROR");
}

impl std::fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DiagnosticCode({})", self.0)
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Standalone constant exports for convenience
pub const LUM_001: DiagnosticCode = DiagnosticCode::LUM_001;
pub const LUM_002: DiagnosticCode = DiagnosticCode::LUM_002;
pub const LUM_003: DiagnosticCode = DiagnosticCode::LUM_003;
pub const LUM_010: DiagnosticCode = DiagnosticCode::LUM_010;
pub const TRY_NOT_RESULT: DiagnosticCode = DiagnosticCode::TRY_NOT_RESULT;
pub const TRY_RETURN_MISMATCH: DiagnosticCode = DiagnosticCode::TRY_RETURN_MISMATCH;
pub const AWAIT_OUTSIDE_ASYNC: DiagnosticCode = DiagnosticCode::AWAIT_OUTSIDE_ASYNC;
pub const RECURSIVE_TYPE_ERROR: DiagnosticCode = DiagnosticCode::RECURSIVE_TYPE_ERROR;
pub const UNSUPPORTED_GADT: DiagnosticCode = DiagnosticCode::UNSUPPORTED_GADT;
pub const UNSUPPORTED_HKT: DiagnosticCode = DiagnosticCode::UNSUPPORTED_HKT;
pub const TRAIT_004: DiagnosticCode = DiagnosticCode::TRAIT_004;
pub const TRAIT_006: DiagnosticCode = DiagnosticCode::TRAIT_006;
pub const TRAIT_012: DiagnosticCode = DiagnosticCode::TRAIT_012;
pub const TRAIT_015: DiagnosticCode = DiagnosticCode::TRAIT_015;
pub const CONST_INVALID_TYPE: DiagnosticCode = DiagnosticCode::CONST_INVALID_TYPE;
pub const CONST_UNBOUND_PARAM: DiagnosticCode = DiagnosticCode::CONST_UNBOUND_PARAM;
pub const CONST_DIV_ZERO: DiagnosticCode = DiagnosticCode::CONST_DIV_ZERO;
pub const LOSSY_CAST: DiagnosticCode = DiagnosticCode::LOSSY_CAST;
pub const TYPE_CAST: DiagnosticCode = DiagnosticCode::TYPE_CAST;
pub const STRING_INTERP_VOID: DiagnosticCode = DiagnosticCode::STRING_INTERP_VOID;
pub const INVALID_INDEX: DiagnosticCode = DiagnosticCode::INVALID_INDEX;
pub const RANGE_TYPE: DiagnosticCode = DiagnosticCode::RANGE_TYPE;
pub const UNRESOLVED_MACRO: DiagnosticCode = DiagnosticCode::UNRESOLVED_MACRO;
pub const PARSE_ERROR: DiagnosticCode = DiagnosticCode::PARSE_ERROR;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_code() {
        let code = DiagnosticCode::new("LUM-099");
        assert_eq!(code.as_str(), "LUM-099");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DiagnosticCode::TRY_NOT_RESULT), "TRY_NOT_RESULT");
    }

    #[test]
    fn test_debug() {
        assert_eq!(
            format!("{:?}", DiagnosticCode::LUM_001),
            "DiagnosticCode(LUM-001)"
        );
    }

    #[test]
    fn test_predefined_codes() {
        assert_eq!(DiagnosticCode::LUM_001.as_str(), "LUM-001");
        assert_eq!(DiagnosticCode::AWAIT_OUTSIDE_ASYNC.as_str(), "AWAIT_OUTSIDE_ASYNC");
        assert_eq!(DiagnosticCode::TRAIT_004.as_str(), "TRAIT-004");
        assert_eq!(DiagnosticCode::CONST_DIV_ZERO.as_str(), "CONST-DIV-ZERO");
    }

    #[test]
    fn test_code_equality() {
        let code1 = DiagnosticCode::new("LUM-001");
        let code2 = DiagnosticCode::new("LUM-001");
        let code3 = DiagnosticCode::new("LUM-002");

        assert_eq!(code1, code2);
        assert_ne!(code1, code3);
    }

    #[test]
    fn test_const_codes() {
        const CODE: DiagnosticCode = DiagnosticCode::TRY_RETURN_MISMATCH;
        assert_eq!(CODE.as_str(), "TRY_RETURN_MISMATCH");
    }
}
