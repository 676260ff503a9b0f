//! Error values produced by the dispatch machinery.
//!
//! All failure modes surface as ordinary values rather than panics, so the
//! facade types can expose fallible and infallible entry points over the
//! same core. The types here are small, `Copy`, and carry no payload beyond
//! what [`core::fmt::Display`] needs.

use core::fmt;

/// Reasons an invocation through a wrapper can fail before the target runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CallError {
    /// The wrapper holds no target.
    NoTarget,
    /// The target requires exclusive access, but the invocation only had
    /// shared access to the wrapper.
    RequiresMut,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::NoTarget => f.write_str("called an empty function wrapper"),
            CallError::RequiresMut => {
                f.write_str("target requires exclusive access but was invoked through a shared reference")
            }
        }
    }
}

impl core::error::Error for CallError {}

/// A wrapper assignment was rejected because the source payload lives in a
/// different allocator pool and the destination cannot re-home it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorMismatchError;

impl fmt::Display for AllocatorMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("wrapper payload belongs to a different allocator pool")
    }
}

impl core::error::Error for AllocatorMismatchError {}

/// A typed extraction from a wrapper named the wrong target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRecoveryError {
    /// The type the caller asked for.
    pub expected: &'static str,
    /// The type actually stored, or `None` when the wrapper was empty.
    pub found: Option<&'static str>,
}

impl fmt::Display for TypeRecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "wrapper target is not of the requested type: expected `{}`, found `{found}`",
                self.expected
            ),
            None => write!(
                f,
                "wrapper target is not of the requested type: expected `{}`, wrapper is empty",
                self.expected
            ),
        }
    }
}

impl core::error::Error for TypeRecoveryError {}
