//! Pure entry builders for the three invoice lifecycle events.
//!
//! Each builder returns a `NewJournalEntry` whose lines are pre-flighted
//! through `validate_balance`, so an inconsistent invoice snapshot (totals
//! that do not add up) is rejected here instead of producing an unbalanced
//! or partial posting downstream.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tradebook_journal::{EntryOrigin, NewEntryLine, NewJournalEntry, validate_balance};

use crate::accounts::{PostingAccounts, PostingError};
use crate::invoice::{InvoiceSnapshot, PaymentMethod};

/// Origin tags stamped on derived entries.
pub const ORIGIN_EMISSION: &str = "invoice.emission";
pub const ORIGIN_PAYMENT: &str = "invoice.payment";
pub const ORIGIN_CANCELLATION: &str = "invoice.cancellation";

/// Emission: DEBIT receivables for the invoice total; CREDIT sales revenue
/// for (subtotal − discounts); CREDIT tax payable for the tax amount, only
/// when tax > 0.
pub fn emission_entry(
    invoice: &InvoiceSnapshot,
    accounts: &PostingAccounts,
) -> Result<NewJournalEntry, PostingError> {
    let revenue = invoice.subtotal - invoice.discount_total;
    let mut lines = vec![
        NewEntryLine::debit(accounts.receivables, invoice.grand_total)
            .describe(format!("Invoice {} — {}", invoice.number, invoice.customer)),
        NewEntryLine::credit(accounts.sales_revenue, revenue)
            .describe(format!("Sales, invoice {}", invoice.number)),
    ];
    if invoice.tax_total > Decimal::ZERO {
        lines.push(
            NewEntryLine::credit(accounts.tax_payable, invoice.tax_total)
                .describe(format!("Tax, invoice {}", invoice.number)),
        );
    }
    validate_balance(&lines)?;

    Ok(NewJournalEntry {
        date: invoice.emitted_on,
        voucher: Some(format!("INV-{}", invoice.number)),
        description: format!("Emission of invoice {}", invoice.number),
        origin: Some(EntryOrigin::new(ORIGIN_EMISSION, invoice.id)),
        lines,
        created_by: None,
    })
}

/// Payment: DEBIT the settlement account mapped from the payment method for
/// the invoice total; CREDIT receivables for the same amount.
pub fn payment_entry(
    invoice: &InvoiceSnapshot,
    method: PaymentMethod,
    accounts: &PostingAccounts,
    paid_on: NaiveDate,
) -> Result<NewJournalEntry, PostingError> {
    let lines = vec![
        NewEntryLine::debit(accounts.settlement_for(method), invoice.grand_total)
            .describe(format!("Payment of invoice {}", invoice.number)),
        NewEntryLine::credit(accounts.receivables, invoice.grand_total)
            .describe(format!("Settles invoice {} — {}", invoice.number, invoice.customer)),
    ];
    validate_balance(&lines)?;

    Ok(NewJournalEntry {
        date: paid_on,
        voucher: Some(format!("PAY-{}", invoice.number)),
        description: format!("Payment of invoice {}", invoice.number),
        origin: Some(EntryOrigin::new(ORIGIN_PAYMENT, invoice.id)),
        lines,
        created_by: None,
    })
}

/// Cancellation: the exact mirror of emission with debit/credit sides
/// swapped; the reason is carried in every line description.
pub fn cancellation_entry(
    invoice: &InvoiceSnapshot,
    reason: &str,
    accounts: &PostingAccounts,
    cancelled_on: NaiveDate,
) -> Result<NewJournalEntry, PostingError> {
    let revenue = invoice.subtotal - invoice.discount_total;
    let note = |what: &str| format!("{what}, invoice {} cancelled: {reason}", invoice.number);
    let mut lines = vec![
        NewEntryLine::credit(accounts.receivables, invoice.grand_total)
            .describe(note("Receivable reversed")),
        NewEntryLine::debit(accounts.sales_revenue, revenue).describe(note("Sales reversed")),
    ];
    if invoice.tax_total > Decimal::ZERO {
        lines.push(
            NewEntryLine::debit(accounts.tax_payable, invoice.tax_total)
                .describe(note("Tax reversed")),
        );
    }
    validate_balance(&lines)?;

    Ok(NewJournalEntry {
        date: cancelled_on,
        voucher: Some(format!("CAN-{}", invoice.number)),
        description: format!("Cancellation of invoice {}: {reason}", invoice.number),
        origin: Some(EntryOrigin::new(ORIGIN_CANCELLATION, invoice.id)),
        lines,
        created_by: None,
    })
}
