//! Chart-of-accounts arena.
//!
//! Accounts are kept in an id-indexed arena with parents stored as ids, so
//! the hierarchy can be validated by bounded upward walks before any
//! reparent commits. Cycles are prevented on write; traversal still carries
//! a visited-set guard so a corrupted store can never hang a read.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use tradebook_core::AccountId;

use crate::account::{Account, AccountClass, AccountCode, AccountError, NewAccount, UpdateAccount};

/// One node of the rebuilt display hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNode {
    pub account: Account,
    pub children: Vec<AccountNode>,
}

/// The chart of accounts: a forest of typed accounts keyed by numeric code.
///
/// Pure in-memory state; thread-safe sharing is the store layer's concern.
#[derive(Debug, Default, Clone)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, Account>,
    by_code: HashMap<AccountCode, AccountId>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account, optionally under a parent referenced by code.
    pub fn create(&mut self, new: NewAccount) -> Result<Account, AccountError> {
        if new.name.trim().is_empty() {
            return Err(AccountError::EmptyName);
        }
        if self.by_code.contains_key(&new.code) {
            return Err(AccountError::DuplicateCode(new.code));
        }

        let parent = match &new.parent {
            None => None,
            Some(code) => {
                let id = *self
                    .by_code
                    .get(code)
                    .ok_or_else(|| AccountError::ParentNotFound(code.clone()))?;
                if !self.accounts[&id].active {
                    return Err(AccountError::ParentInactive(code.clone()));
                }
                Some(id)
            }
        };

        let account = Account {
            id: AccountId::new(),
            code: new.code.clone(),
            name: new.name,
            class: new.class,
            active: true,
            parent,
        };
        self.by_code.insert(new.code, account.id);
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Bulk-create; used to install a seed chart. Parents must precede
    /// children in the iteration order.
    pub fn seed(
        &mut self,
        accounts: impl IntoIterator<Item = NewAccount>,
    ) -> Result<(), AccountError> {
        for new in accounts {
            self.create(new)?;
        }
        Ok(())
    }

    /// Update name and/or parent. Reparenting is rejected when the new
    /// parent is the account itself or one of its descendants.
    pub fn update(&mut self, id: AccountId, update: UpdateAccount) -> Result<Account, AccountError> {
        if !self.accounts.contains_key(&id) {
            return Err(AccountError::NotFound(id));
        }

        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(AccountError::EmptyName);
            }
        }

        if let Some(new_parent) = update.parent {
            if let Some(parent_id) = new_parent {
                let parent = self
                    .accounts
                    .get(&parent_id)
                    .ok_or(AccountError::NotFound(parent_id))?;
                if !parent.active {
                    return Err(AccountError::ParentInactive(parent.code.clone()));
                }
                // The new parent must not sit below the account being moved.
                if parent_id == id || self.is_ancestor(id, parent_id) {
                    return Err(AccountError::CircularReference {
                        account: id,
                        parent: parent_id,
                    });
                }
            }
            let account = self.accounts.get_mut(&id).expect("checked above");
            account.parent = new_parent;
        }

        if let Some(name) = update.name {
            let account = self.accounts.get_mut(&id).expect("checked above");
            account.name = name;
        }

        Ok(self.accounts[&id].clone())
    }

    /// Soft-deactivate an account. Rejected while active children exist.
    pub fn deactivate(&mut self, id: AccountId) -> Result<Account, AccountError> {
        let code = self
            .accounts
            .get(&id)
            .ok_or(AccountError::NotFound(id))?
            .code
            .clone();

        let has_active_children = self
            .accounts
            .values()
            .any(|a| a.parent == Some(id) && a.active);
        if has_active_children {
            return Err(AccountError::HasActiveChildren(code));
        }

        let account = self.accounts.get_mut(&id).expect("checked above");
        account.active = false;
        Ok(account.clone())
    }

    /// Flip an inactive account back on.
    pub fn reactivate(&mut self, id: AccountId) -> Result<Account, AccountError> {
        let account = self.accounts.get_mut(&id).ok_or(AccountError::NotFound(id))?;
        account.active = true;
        Ok(account.clone())
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn require(&self, id: AccountId) -> Result<&Account, AccountError> {
        self.accounts.get(&id).ok_or(AccountError::NotFound(id))
    }

    pub fn get_by_code(&self, code: &AccountCode) -> Option<&Account> {
        self.by_code.get(code).and_then(|id| self.accounts.get(id))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Direct children of an account, ordered by code.
    pub fn list_children(&self, parent: AccountId) -> Vec<&Account> {
        let mut children: Vec<&Account> = self
            .accounts
            .values()
            .filter(|a| a.parent == Some(parent))
            .collect();
        children.sort_by(|a, b| a.code.cmp(&b.code));
        children
    }

    /// Root accounts (no parent), optionally filtered by class, ordered by code.
    pub fn list_roots(&self, class: Option<AccountClass>) -> Vec<&Account> {
        let mut roots: Vec<&Account> = self
            .accounts
            .values()
            .filter(|a| a.parent.is_none() && class.is_none_or(|c| a.class == c))
            .collect();
        roots.sort_by(|a, b| a.code.cmp(&b.code));
        roots
    }

    /// Rebuild the full hierarchy as nested groups for display.
    ///
    /// Never revisits a node: even if the stored parent links were corrupted
    /// into a cycle, every account is emitted exactly once.
    pub fn tree(&self) -> Vec<AccountNode> {
        let mut children_of: HashMap<AccountId, Vec<&Account>> = HashMap::new();
        for account in self.accounts.values() {
            if let Some(parent) = account.parent {
                children_of.entry(parent).or_default().push(account);
            }
        }
        for list in children_of.values_mut() {
            list.sort_by(|a, b| a.code.cmp(&b.code));
        }

        let mut visited = HashSet::new();
        let mut roots: Vec<AccountNode> = self
            .list_roots(None)
            .into_iter()
            .map(|a| self.build_node(a, &children_of, &mut visited))
            .collect();

        // Orphans whose parent link points into a cycle (or at a missing id)
        // still belong in the display tree; surface them at the top level.
        let mut orphans: Vec<&Account> = self
            .accounts
            .values()
            .filter(|a| !visited.contains(&a.id))
            .collect();
        orphans.sort_by(|a, b| a.code.cmp(&b.code));
        for orphan in orphans {
            if !visited.contains(&orphan.id) {
                roots.push(self.build_node(orphan, &children_of, &mut visited));
            }
        }

        roots
    }

    fn build_node(
        &self,
        account: &Account,
        children_of: &HashMap<AccountId, Vec<&Account>>,
        visited: &mut HashSet<AccountId>,
    ) -> AccountNode {
        visited.insert(account.id);
        let mut children = Vec::new();
        if let Some(list) = children_of.get(&account.id) {
            for child in list {
                if !visited.contains(&child.id) {
                    children.push(self.build_node(child, children_of, visited));
                }
            }
        }
        AccountNode {
            account: account.clone(),
            children,
        }
    }

    /// Bounded upward walk: is `ancestor` on `node`'s parent chain?
    ///
    /// The visited set bounds the walk even if parent links were corrupted
    /// into a cycle behind our back.
    fn is_ancestor(&self, ancestor: AccountId, node: AccountId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.accounts.get(&node).and_then(|a| a.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.accounts.get(&id).and_then(|a| a.parent);
        }
        false
    }
}
