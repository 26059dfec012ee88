//! Double-entry journal domain module.
//!
//! A journal entry is a balanced set of two or more debit/credit lines over
//! the chart of accounts. Entries are immutable once created; the only write
//! operations are create and delete-with-cascade.

pub mod balance;
pub mod entry;

pub use balance::{AccountActivity, BalanceTotals, validate_balance};
pub use entry::{
    EntryLine, EntryOrigin, JournalEntry, JournalError, NewEntryLine, NewJournalEntry, Side,
};
