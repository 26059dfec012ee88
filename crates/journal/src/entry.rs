use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradebook_core::{AccountId, Entity, EntryId, ErrorKind, Fault, LineId, UserId};

use crate::balance::validate_balance;

/// Side of a journal entry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

/// One debit or credit leg of an entry, tied to one account.
///
/// Exclusively owned by its entry; deleted only through entry deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    pub id: LineId,
    pub account_id: AccountId,
    pub side: Side,
    /// Strictly positive; the side carries the sign.
    pub amount: Decimal,
    pub description: Option<String>,
}

impl EntryLine {
    /// Signed amount: positive for debit, negative for credit.
    pub fn signed_amount(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => -self.amount,
        }
    }
}

/// Which business event produced an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOrigin {
    /// Stable tag, e.g. "invoice.emission".
    pub tag: String,
    pub id: uuid::Uuid,
}

impl EntryOrigin {
    pub fn new(tag: impl Into<String>, id: impl Into<uuid::Uuid>) -> Self {
        Self {
            tag: tag.into(),
            id: id.into(),
        }
    }
}

/// One balanced double-entry posting. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    /// Caller-supplied unique external reference.
    pub voucher: Option<String>,
    pub description: String,
    pub origin: Option<EntryOrigin>,
    pub lines: Vec<EntryLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for JournalEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl JournalEntry {
    pub fn lines_for(&self, account: AccountId) -> impl Iterator<Item = &EntryLine> {
        self.lines.iter().filter(move |l| l.account_id == account)
    }
}

/// Input line for entry creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntryLine {
    pub account_id: AccountId,
    pub side: Side,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl NewEntryLine {
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            side: Side::Debit,
            amount,
            description: None,
        }
    }

    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            side: Side::Credit,
            amount,
            description: None,
        }
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Input for entry creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    pub date: NaiveDate,
    pub voucher: Option<String>,
    pub description: String,
    pub origin: Option<EntryOrigin>,
    pub lines: Vec<NewEntryLine>,
    pub created_by: Option<UserId>,
}

impl NewJournalEntry {
    /// Validate and materialize the entry with generated ids and totals.
    pub fn into_entry(self, created_at: DateTime<Utc>) -> Result<JournalEntry, JournalError> {
        let totals = validate_balance(&self.lines)?;
        let lines = self
            .lines
            .into_iter()
            .map(|l| EntryLine {
                id: LineId::new(),
                account_id: l.account_id,
                side: l.side,
                amount: l.amount,
                description: l.description,
            })
            .collect();
        Ok(JournalEntry {
            id: EntryId::new(),
            date: self.date,
            voucher: self.voucher,
            description: self.description,
            origin: self.origin,
            lines,
            total_debit: totals.debits,
            total_credit: totals.credits,
            created_by: self.created_by,
            created_at,
        })
    }
}

/// Journal failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("a journal entry needs at least two lines, got {0}")]
    TooFewLines(usize),

    #[error("line amounts must be strictly positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("entry is unbalanced: debits {debits}, credits {credits}")]
    Unbalanced { debits: Decimal, credits: Decimal },

    #[error("voucher {0:?} is already used")]
    DuplicateVoucher(String),

    #[error("line references unknown account {0}")]
    UnknownAccount(AccountId),

    #[error("journal entry {0} not found")]
    NotFound(EntryId),
}

impl Fault for JournalError {
    fn kind(&self) -> ErrorKind {
        match self {
            JournalError::TooFewLines(_)
            | JournalError::NonPositiveAmount(_)
            | JournalError::Unbalanced { .. } => ErrorKind::Validation,
            JournalError::DuplicateVoucher(_) => ErrorKind::Conflict,
            JournalError::UnknownAccount(_) | JournalError::NotFound(_) => {
                ErrorKind::MissingReference
            }
        }
    }
}
