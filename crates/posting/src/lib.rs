//! Posting integration domain module.
//!
//! Translates invoice lifecycle events (emission, payment, cancellation)
//! into balanced journal entries. Every builder is a pure function of
//! (invoice snapshot, resolved accounts) → entry; actually consuming stock
//! or writing the entry is the pipeline's job, not this crate's.

pub mod accounts;
pub mod entries;
pub mod invoice;

pub use accounts::{PostingAccounts, PostingError, codes, standard_chart};
pub use entries::{cancellation_entry, emission_entry, payment_entry};
pub use invoice::{InvoiceEvent, InvoiceLineSnapshot, InvoiceSnapshot, PaymentMethod};
