//! Thread-safe account registry over the chart-of-accounts arena.

use std::sync::RwLock;

use tradebook_accounts::{
    Account, AccountClass, AccountCode, AccountError, AccountNode, ChartOfAccounts, NewAccount,
    UpdateAccount,
};
use tradebook_core::AccountId;

use crate::sync;

/// Shared registry; all operations take `&self` and serialize through an
/// internal `RwLock`.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    chart: RwLock<ChartOfAccounts>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chart(chart: ChartOfAccounts) -> Self {
        Self {
            chart: RwLock::new(chart),
        }
    }

    /// Run a read-only closure against the chart.
    pub fn read<R>(&self, f: impl FnOnce(&ChartOfAccounts) -> R) -> R {
        f(&sync::read(&self.chart))
    }

    pub fn create(&self, new: NewAccount) -> Result<Account, AccountError> {
        sync::write(&self.chart).create(new)
    }

    pub fn seed(
        &self,
        accounts: impl IntoIterator<Item = NewAccount>,
    ) -> Result<(), AccountError> {
        sync::write(&self.chart).seed(accounts)
    }

    pub fn update(&self, id: AccountId, update: UpdateAccount) -> Result<Account, AccountError> {
        sync::write(&self.chart).update(id, update)
    }

    pub fn deactivate(&self, id: AccountId) -> Result<Account, AccountError> {
        sync::write(&self.chart).deactivate(id)
    }

    pub fn reactivate(&self, id: AccountId) -> Result<Account, AccountError> {
        sync::write(&self.chart).reactivate(id)
    }

    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.read(|c| c.get(id).cloned())
    }

    pub fn get_by_code(&self, code: &AccountCode) -> Option<Account> {
        self.read(|c| c.get_by_code(code).cloned())
    }

    pub fn list_children(&self, parent: AccountId) -> Vec<Account> {
        self.read(|c| c.list_children(parent).into_iter().cloned().collect())
    }

    pub fn list_roots(&self, class: Option<AccountClass>) -> Vec<Account> {
        self.read(|c| c.list_roots(class).into_iter().cloned().collect())
    }

    pub fn tree(&self) -> Vec<AccountNode> {
        self.read(|c| c.tree())
    }
}
