//! Chart-of-accounts domain module.
//!
//! This crate contains the account registry business rules, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod account;
pub mod chart;

pub use account::{Account, AccountClass, AccountCode, AccountError, NewAccount, UpdateAccount};
pub use chart::{AccountNode, ChartOfAccounts};
