//! Journal entry store: atomic create, cascade delete, balance queries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{NaiveDate, Utc};

use tradebook_core::{AccountId, EntryId};
use tradebook_journal::{AccountActivity, JournalEntry, JournalError, NewJournalEntry};

use crate::registry::AccountRegistry;
use crate::sync;

/// Lookup seam the journal uses to verify line accounts exist.
pub trait AccountDirectory: Send + Sync {
    fn contains(&self, id: AccountId) -> bool;
}

impl AccountDirectory for AccountRegistry {
    fn contains(&self, id: AccountId) -> bool {
        self.read(|chart| chart.contains(id))
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<EntryId, JournalEntry>,
    by_voucher: HashMap<String, EntryId>,
}

/// The book of original entry.
///
/// Entries are immutable once created; the only writes are `create` and
/// `delete` (which cascades to the owned lines). The duplicate-voucher
/// check, the balance validation, and the insert all happen under one write
/// lock, so a partially-posted or unbalanced entry is never visible.
pub struct JournalStore {
    inner: RwLock<Inner>,
    directory: Arc<dyn AccountDirectory>,
}

impl JournalStore {
    pub fn new(directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            directory,
        }
    }

    /// Validate and persist an entry with its lines, all or nothing.
    pub fn create(&self, new: NewJournalEntry) -> Result<JournalEntry, JournalError> {
        for line in &new.lines {
            if !self.directory.contains(line.account_id) {
                return Err(JournalError::UnknownAccount(line.account_id));
            }
        }

        let mut inner = sync::write(&self.inner);
        if let Some(voucher) = &new.voucher {
            if inner.by_voucher.contains_key(voucher) {
                return Err(JournalError::DuplicateVoucher(voucher.clone()));
            }
        }

        let entry = new.into_entry(Utc::now())?;
        if let Some(voucher) = &entry.voucher {
            inner.by_voucher.insert(voucher.clone(), entry.id);
        }
        inner.entries.insert(entry.id, entry.clone());

        tracing::debug!(
            entry_id = %entry.id,
            voucher = entry.voucher.as_deref().unwrap_or("-"),
            total = %entry.total_debit,
            "journal entry posted"
        );
        Ok(entry)
    }

    /// Delete an entry; its lines go with it.
    pub fn delete(&self, id: EntryId) -> Result<JournalEntry, JournalError> {
        let mut inner = sync::write(&self.inner);
        let entry = inner.entries.remove(&id).ok_or(JournalError::NotFound(id))?;
        if let Some(voucher) = &entry.voucher {
            inner.by_voucher.remove(voucher);
        }
        Ok(entry)
    }

    pub fn get(&self, id: EntryId) -> Option<JournalEntry> {
        sync::read(&self.inner).entries.get(&id).cloned()
    }

    pub fn get_by_voucher(&self, voucher: &str) -> Option<JournalEntry> {
        let inner = sync::read(&self.inner);
        let id = inner.by_voucher.get(voucher)?;
        inner.entries.get(id).cloned()
    }

    /// Entries with posting date in `[from, to]`, ordered by date then voucher.
    pub fn list_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<JournalEntry> {
        let inner = sync::read(&self.inner);
        let mut entries: Vec<JournalEntry> = inner
            .entries
            .values()
            .filter(|e| e.date >= from && e.date <= to)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date, &a.voucher).cmp(&(b.date, &b.voucher)));
        entries
    }

    /// The journal as the append-only book of original entry.
    pub fn journal(&self, from: NaiveDate, to: NaiveDate) -> Vec<JournalEntry> {
        self.list_by_date_range(from, to)
    }

    /// Entries touching an account, optionally restricted to a date range.
    pub fn list_by_account(
        &self,
        account: AccountId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Vec<JournalEntry> {
        let inner = sync::read(&self.inner);
        let mut entries: Vec<JournalEntry> = inner
            .entries
            .values()
            .filter(|e| e.lines.iter().any(|l| l.account_id == account))
            .filter(|e| range.is_none_or(|(from, to)| e.date >= from && e.date <= to))
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date, &a.voucher).cmp(&(b.date, &b.voucher)));
        entries
    }

    /// Per-side totals and signed balance (`debits − credits`) for an
    /// account, counting entries dated up to `as_of` when given.
    pub fn account_balance(
        &self,
        account: AccountId,
        as_of: Option<NaiveDate>,
    ) -> Result<AccountActivity, JournalError> {
        if !self.directory.contains(account) {
            return Err(JournalError::UnknownAccount(account));
        }

        let inner = sync::read(&self.inner);
        let mut activity = AccountActivity::ZERO;
        for entry in inner.entries.values() {
            if as_of.is_some_and(|cutoff| entry.date > cutoff) {
                continue;
            }
            for line in entry.lines_for(account) {
                activity.add(line.side, line.amount);
            }
        }
        Ok(activity)
    }

    pub fn len(&self) -> usize {
        sync::read(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
