use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradebook_core::{AccountId, Entity, ErrorKind, Fault};

/// High-level account class (determines which side of the books it lives on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Short numeric account code (1–8 ASCII digits), globally unique.
///
/// Codes follow the usual chart convention where the first digit encodes the
/// class ("1105" cash, "4135" sales revenue); the registry does not enforce
/// that convention, only the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCode(String);

impl AccountCode {
    pub fn new(code: impl Into<String>) -> Result<Self, AccountError> {
        let code = code.into();
        if code.is_empty() || code.len() > 8 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccountError::InvalidCode(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node in the chart of accounts.
///
/// Parent is stored as an id (weak reference), never a live pointer; the
/// chart arena resolves it. Accounts are soft-deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: AccountCode,
    pub name: String,
    pub class: AccountClass,
    pub active: bool,
    pub parent: Option<AccountId>,
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for account creation. Parent is referenced by code, matching how
/// charts are written down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub code: AccountCode,
    pub name: String,
    pub class: AccountClass,
    pub parent: Option<AccountCode>,
}

impl NewAccount {
    pub fn root(code: AccountCode, name: impl Into<String>, class: AccountClass) -> Self {
        Self {
            code,
            name: name.into(),
            class,
            parent: None,
        }
    }

    pub fn under(
        code: AccountCode,
        name: impl Into<String>,
        class: AccountClass,
        parent: AccountCode,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            class,
            parent: Some(parent),
        }
    }
}

/// Partial update for an existing account.
///
/// `parent` distinguishes "leave unchanged" (`None`) from "detach to root"
/// (`Some(None)`) from "reparent" (`Some(Some(id))`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateAccount {
    pub name: Option<String>,
    pub parent: Option<Option<AccountId>>,
}

/// Account registry failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("account code must be 1-8 digits, got {0:?}")]
    InvalidCode(String),

    #[error("account name cannot be empty")]
    EmptyName,

    #[error("account code {0} already exists")]
    DuplicateCode(AccountCode),

    #[error("parent account {0} does not exist")]
    ParentNotFound(AccountCode),

    #[error("parent account {0} is inactive")]
    ParentInactive(AccountCode),

    #[error("account {0} not found")]
    NotFound(AccountId),

    #[error("reparenting {account} under {parent} would create a cycle")]
    CircularReference { account: AccountId, parent: AccountId },

    #[error("account {0} still has active child accounts")]
    HasActiveChildren(AccountCode),
}

impl Fault for AccountError {
    fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidCode(_)
            | AccountError::EmptyName
            | AccountError::ParentInactive(_) => ErrorKind::Validation,
            AccountError::ParentNotFound(_) | AccountError::NotFound(_) => {
                ErrorKind::MissingReference
            }
            AccountError::DuplicateCode(_)
            | AccountError::CircularReference { .. }
            | AccountError::HasActiveChildren(_) => ErrorKind::Conflict,
        }
    }
}
