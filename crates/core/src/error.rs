//! Error taxonomy shared across the ledger components.
//!
//! Each component keeps its own `thiserror` enum with named variants; this
//! module only provides the classification callers use to tell a validation
//! failure from a missing reference from a conflict.

/// Broad failure category, stable across components.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input failed validation (malformed code, zero amount, insufficient
    /// stock, unbalanced entry). Rejected before any write.
    Validation,
    /// A referenced record does not exist (unknown account, product, entry).
    MissingReference,
    /// The operation collides with existing state (duplicate code/voucher,
    /// circular hierarchy, deactivation blocked by children).
    Conflict,
    /// The system is wired wrong (e.g. a well-known account is missing from
    /// the chart). Never auto-corrected.
    Configuration,
}

impl ErrorKind {
    pub fn is_conflict(self) -> bool {
        self == ErrorKind::Conflict
    }

    pub fn is_missing_reference(self) -> bool {
        self == ErrorKind::MissingReference
    }
}

/// Implemented by every component error enum.
///
/// Constraint violations always surface to the caller; nothing in the ledger
/// components swallows, retries, or auto-corrects a broken invariant.
pub trait Fault: std::error::Error {
    fn kind(&self) -> ErrorKind;
}
