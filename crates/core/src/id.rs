//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An identifier string failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid identifier: {0}")]
pub struct InvalidId(pub String);

macro_rules! impl_uuid_newtype {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| InvalidId(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(
    /// Identifier of a chart-of-accounts node.
    AccountId, "AccountId"
);
impl_uuid_newtype!(
    /// Identifier of a journal entry.
    EntryId, "EntryId"
);
impl_uuid_newtype!(
    /// Identifier of one debit/credit leg of a journal entry.
    LineId, "LineId"
);
impl_uuid_newtype!(
    /// Identifier of a stock movement. UUIDv7 ordering doubles as the
    /// tie-break when replaying movements recorded at the same instant.
    MovementId, "MovementId"
);
impl_uuid_newtype!(
    /// Identifier of a product (external catalog entity).
    ProductId, "ProductId"
);
impl_uuid_newtype!(
    /// Identifier of an invoice (external invoicing entity).
    InvoiceId, "InvoiceId"
);
impl_uuid_newtype!(
    /// Identifier of a user (actor identity).
    UserId, "UserId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_id_is_rejected() {
        let err = "not-a-uuid".parse::<ProductId>().unwrap_err();
        assert!(err.0.contains("ProductId"));
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let a = MovementId::new();
        let b = MovementId::new();
        assert!(a <= b);
    }
}
