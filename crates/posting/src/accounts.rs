//! Well-known account convention.
//!
//! The integration service never invents accounts: it looks these codes up
//! in the registry and treats a missing one as a hard configuration error,
//! surfaced before any entry is built.

use thiserror::Error;

use tradebook_accounts::{
    AccountClass, AccountCode, AccountError, ChartOfAccounts, NewAccount,
};
use tradebook_core::{AccountId, ErrorKind, Fault};
use tradebook_journal::JournalError;

use crate::invoice::PaymentMethod;

/// Fixed account codes the posting convention relies on.
pub mod codes {
    pub const CASH: &str = "1105";
    pub const BANK: &str = "1110";
    pub const RECEIVABLES: &str = "1305";
    pub const TAX_PAYABLE: &str = "2408";
    pub const SALES_REVENUE: &str = "4135";
}

/// Posting integration failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostingError {
    #[error("required account {0} is missing from the chart")]
    MissingAccount(AccountCode),

    #[error("required account {0} is inactive")]
    InactiveAccount(AccountCode),

    #[error("well-known account code is malformed: {0}")]
    BadCode(#[from] AccountError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl Fault for PostingError {
    fn kind(&self) -> ErrorKind {
        match self {
            PostingError::MissingAccount(_)
            | PostingError::InactiveAccount(_)
            | PostingError::BadCode(_) => ErrorKind::Configuration,
            PostingError::Journal(e) => e.kind(),
        }
    }
}

/// The well-known accounts, resolved once against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingAccounts {
    pub receivables: AccountId,
    pub sales_revenue: AccountId,
    pub tax_payable: AccountId,
    pub cash: AccountId,
    pub bank: AccountId,
}

impl PostingAccounts {
    /// Look up every well-known account; any missing or inactive one is a
    /// configuration error.
    pub fn resolve(chart: &ChartOfAccounts) -> Result<Self, PostingError> {
        Ok(Self {
            receivables: required(chart, codes::RECEIVABLES)?,
            sales_revenue: required(chart, codes::SALES_REVENUE)?,
            tax_payable: required(chart, codes::TAX_PAYABLE)?,
            cash: required(chart, codes::CASH)?,
            bank: required(chart, codes::BANK)?,
        })
    }

    /// Settlement account for a payment method: cash → cash account,
    /// bank-like methods → bank account, anything else defaults to cash.
    pub fn settlement_for(&self, method: PaymentMethod) -> AccountId {
        match method {
            PaymentMethod::BankTransfer | PaymentMethod::Card | PaymentMethod::Check => self.bank,
            PaymentMethod::Cash | PaymentMethod::Other => self.cash,
        }
    }
}

fn required(chart: &ChartOfAccounts, code: &str) -> Result<AccountId, PostingError> {
    let code = AccountCode::new(code)?;
    let account = chart
        .get_by_code(&code)
        .ok_or_else(|| PostingError::MissingAccount(code.clone()))?;
    if !account.active {
        return Err(PostingError::InactiveAccount(code));
    }
    Ok(account.id)
}

/// Seed chart carrying the class roots plus every well-known account.
pub fn standard_chart() -> Result<Vec<NewAccount>, AccountError> {
    Ok(vec![
        NewAccount::root(AccountCode::new("1")?, "Assets", AccountClass::Asset),
        NewAccount::root(AccountCode::new("2")?, "Liabilities", AccountClass::Liability),
        NewAccount::root(AccountCode::new("3")?, "Equity", AccountClass::Equity),
        NewAccount::root(AccountCode::new("4")?, "Revenue", AccountClass::Revenue),
        NewAccount::root(AccountCode::new("5")?, "Expenses", AccountClass::Expense),
        NewAccount::under(
            AccountCode::new(codes::CASH)?,
            "Cash",
            AccountClass::Asset,
            AccountCode::new("1")?,
        ),
        NewAccount::under(
            AccountCode::new(codes::BANK)?,
            "Banks",
            AccountClass::Asset,
            AccountCode::new("1")?,
        ),
        NewAccount::under(
            AccountCode::new(codes::RECEIVABLES)?,
            "Accounts receivable",
            AccountClass::Asset,
            AccountCode::new("1")?,
        ),
        NewAccount::under(
            AccountCode::new(codes::TAX_PAYABLE)?,
            "Sales tax payable",
            AccountClass::Liability,
            AccountCode::new("2")?,
        ),
        NewAccount::under(
            AccountCode::new(codes::SALES_REVENUE)?,
            "Sales revenue",
            AccountClass::Revenue,
            AccountCode::new("4")?,
        ),
    ])
}
