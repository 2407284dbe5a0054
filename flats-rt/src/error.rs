use std::fmt;

use thiserror::Error;

/// Failure codes raised by generated accessors and the container
/// primitives. The numeric order is part of the wire-facing contract
/// and must not be rearranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadInt,
    BadArrayInit,
    TailTooBig,
    BadSpanIndex,
    ArrayInitializer,
    SmallBuffer,
    OptionalNotPresent,
    CstringOverflow,
    Truncation,
    Narrowing,
    VariantTag,
    FixedArrayOverflow,
}

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::BadInt => "bad int",
            ErrorCode::BadArrayInit => "bad array init",
            ErrorCode::TailTooBig => "tail too big",
            ErrorCode::BadSpanIndex => "bad span index",
            ErrorCode::ArrayInitializer => "array initializer",
            ErrorCode::SmallBuffer => "buffer too small",
            ErrorCode::OptionalNotPresent => "optional not present",
            ErrorCode::CstringOverflow => "C-style string too long",
            ErrorCode::Truncation => "C-style string truncation",
            ErrorCode::Narrowing => "narrowing",
            ErrorCode::VariantTag => "bad variant tag",
            ErrorCode::FixedArrayOverflow => "fixed array overflow",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("flats runtime error: {0}")]
pub struct RuntimeError(pub ErrorCode);

/// How a failed check is acted upon. Chosen per check site by the
/// embedder; the compiler's own emissions default to `Testing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Checks compile to nothing.
    Ignoring,
    /// Log to stderr and continue.
    Logging,
    /// Return the error.
    Throwing,
    /// Abort the process.
    Terminating,
    /// Log to stderr and return the error.
    Testing,
}

pub const DEFAULT_POLICY: Policy = Policy::Testing;

/// Check primitive for generated code and the container types.
///
/// Returns `Err` carrying `code` when `cond` is false, subject to the
/// default policy.
pub fn expect(cond: bool, code: ErrorCode) -> Result<(), RuntimeError> {
    expect_with(DEFAULT_POLICY, cond, code)
}

pub fn expect_with(policy: Policy, cond: bool, code: ErrorCode) -> Result<(), RuntimeError> {
    if cond {
        return Ok(());
    }
    match policy {
        Policy::Ignoring => Ok(()),
        Policy::Logging => {
            eprintln!("Flats error: {code}");
            Ok(())
        }
        Policy::Throwing => Err(RuntimeError(code)),
        Policy::Terminating => std::process::abort(),
        Policy::Testing => {
            eprintln!("Flats error: {code}");
            Err(RuntimeError(code))
        }
    }
}

/// Narrow a host-sized count to an `Offset`, checking for loss.
pub fn narrow(x: usize) -> Result<super::Offset, RuntimeError> {
    super::Offset::try_from(x).map_err(|_| RuntimeError(ErrorCode::Narrowing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_check_is_ok() {
        assert!(expect(true, ErrorCode::TailTooBig).is_ok());
    }

    #[test]
    fn failing_check_carries_its_code() {
        let err = expect_with(Policy::Throwing, false, ErrorCode::VariantTag).unwrap_err();
        assert_eq!(err, RuntimeError(ErrorCode::VariantTag));
    }

    #[test]
    fn ignoring_policy_swallows_failures() {
        assert!(expect_with(Policy::Ignoring, false, ErrorCode::SmallBuffer).is_ok());
    }

    #[test]
    fn narrow_rejects_oversized_counts() {
        assert_eq!(narrow(40_000).unwrap_err(), RuntimeError(ErrorCode::Narrowing));
        assert_eq!(narrow(5).unwrap(), 5);
    }

    #[test]
    fn codes_have_printable_names() {
        assert_eq!(ErrorCode::OptionalNotPresent.to_string(), "optional not present");
        assert_eq!(ErrorCode::FixedArrayOverflow.to_string(), "fixed array overflow");
    }
}
