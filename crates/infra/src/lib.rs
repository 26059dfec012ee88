//! Infrastructure layer: thread-safe stores and the invoice event pipeline.
//!
//! The stores here are in-memory (the domain is storage-model-agnostic and
//! could be backed by any transactional relational store); they enforce the
//! same atomicity and serialization contracts a database would:
//!
//! - journal balance check + line insert happen under one write lock,
//! - movement writes for one product are serialized by a per-product mutex,
//! - `recalculate` holds that mutex for its whole rewrite.

pub mod journal_store;
pub mod ledger;
pub mod pipeline;
pub mod registry;

mod sync;

#[cfg(test)]
mod integration_tests;

pub use journal_store::{AccountDirectory, JournalStore};
pub use ledger::{InventoryLedger, NullMirror, StockMirror};
pub use pipeline::{Applied, HandlerFailure, InvoicePipeline, PostingHandler, StockHandler, StockOutcome};
pub use registry::AccountRegistry;
