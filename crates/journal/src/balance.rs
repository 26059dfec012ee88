//! Balance checking: the fundamental double-entry invariant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entry::{JournalError, NewEntryLine, Side};

/// Per-side totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub debits: Decimal,
    pub credits: Decimal,
}

/// Pre-flight balance validation with no side effects.
///
/// Enforces, in order: at least two lines, every amount strictly positive,
/// and `sum(debits) == sum(credits)` exactly. Callers use this before
/// submission; entry creation runs the same checks again.
pub fn validate_balance(lines: &[NewEntryLine]) -> Result<BalanceTotals, JournalError> {
    if lines.len() < 2 {
        return Err(JournalError::TooFewLines(lines.len()));
    }

    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    for line in lines {
        if line.amount <= Decimal::ZERO {
            return Err(JournalError::NonPositiveAmount(line.amount));
        }
        match line.side {
            Side::Debit => debits += line.amount,
            Side::Credit => credits += line.amount,
        }
    }

    if debits != credits {
        return Err(JournalError::Unbalanced { debits, credits });
    }

    Ok(BalanceTotals { debits, credits })
}

/// Account activity summary: per-side totals, the signed balance
/// (`debits − credits`), and how many lines contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub debits: Decimal,
    pub credits: Decimal,
    pub balance: Decimal,
    pub line_count: usize,
}

impl AccountActivity {
    pub const ZERO: AccountActivity = AccountActivity {
        debits: Decimal::ZERO,
        credits: Decimal::ZERO,
        balance: Decimal::ZERO,
        line_count: 0,
    };

    pub fn add(&mut self, side: Side, amount: Decimal) {
        match side {
            Side::Debit => self.debits += amount,
            Side::Credit => self.credits += amount,
        }
        self.balance = self.debits - self.credits;
        self.line_count += 1;
    }
}
