use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradebook_core::{InvoiceId, ProductId};
use tradebook_events::Event;

/// One invoice line as consumed from the invoicing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineSnapshot {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Point-in-time view of an invoice, passed into the posting builders.
///
/// Amount fields are the invoicing side's own arithmetic; the posting
/// builders re-check it implicitly, since an inconsistent snapshot produces
/// an unbalanced entry and is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    pub id: InvoiceId,
    /// Human-facing invoice number ("F-2024-0042"); doubles as the
    /// idempotency key for everything derived from this invoice.
    pub number: String,
    pub customer: String,
    pub emitted_on: NaiveDate,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
    pub lines: Vec<InvoiceLineSnapshot>,
}

/// How an invoice was settled.
///
/// The settlement-account mapping is a fixed convention: cash pays into the
/// cash account, bank-like methods into the bank account, and anything
/// unknown falls back to cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Check,
    Other,
}

impl PaymentMethod {
    /// Parse a free-form label from the invoicing side. Unknown labels map
    /// to `Other` (which settles to cash).
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "transfer" | "bank_transfer" | "wire" => PaymentMethod::BankTransfer,
            "card" | "credit_card" | "debit_card" => PaymentMethod::Card,
            "check" | "cheque" => PaymentMethod::Check,
            _ => PaymentMethod::Other,
        }
    }
}

/// Invoice lifecycle events published by the invoicing use cases.
///
/// Stock consumption and ledger posting subscribe to these independently;
/// each handler is idempotent keyed on the invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvoiceEvent {
    Emitted {
        invoice: InvoiceSnapshot,
        occurred_at: DateTime<Utc>,
    },
    Paid {
        invoice: InvoiceSnapshot,
        method: PaymentMethod,
        occurred_at: DateTime<Utc>,
    },
    Cancelled {
        invoice: InvoiceSnapshot,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
}

impl InvoiceEvent {
    pub fn invoice(&self) -> &InvoiceSnapshot {
        match self {
            InvoiceEvent::Emitted { invoice, .. }
            | InvoiceEvent::Paid { invoice, .. }
            | InvoiceEvent::Cancelled { invoice, .. } => invoice,
        }
    }
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::Emitted { .. } => "invoicing.invoice.emitted",
            InvoiceEvent::Paid { .. } => "invoicing.invoice.paid",
            InvoiceEvent::Cancelled { .. } => "invoicing.invoice.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::Emitted { occurred_at, .. }
            | InvoiceEvent::Paid { occurred_at, .. }
            | InvoiceEvent::Cancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_payment_labels_map_to_other() {
        assert_eq!(PaymentMethod::from_label("cash"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::from_label("WIRE"), PaymentMethod::BankTransfer);
        assert_eq!(PaymentMethod::from_label("crypto"), PaymentMethod::Other);
    }

    #[test]
    fn event_payloads_keep_a_stable_wire_shape() {
        let event = InvoiceEvent::Paid {
            invoice: InvoiceSnapshot {
                id: tradebook_core::InvoiceId::new(),
                number: "F-2024-0042".to_string(),
                customer: "Acme Ltd".to_string(),
                emitted_on: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
                subtotal: rust_decimal_macros::dec!(100.00),
                discount_total: rust_decimal_macros::dec!(0),
                tax_total: rust_decimal_macros::dec!(19.00),
                grand_total: rust_decimal_macros::dec!(119.00),
                lines: vec![InvoiceLineSnapshot {
                    product_id: tradebook_core::ProductId::new(),
                    quantity: 3,
                }],
            },
            method: PaymentMethod::BankTransfer,
            occurred_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "paid");
        assert_eq!(json["method"], "bank_transfer");
        assert_eq!(json["invoice"]["number"], "F-2024-0042");

        let back: InvoiceEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
