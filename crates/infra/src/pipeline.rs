//! Invoice event pipeline: posting and stock handlers behind the bus.
//!
//! The invoicing side publishes lifecycle events; the journal and the stock
//! ledger each react through their own handler. Handlers are idempotent
//! keyed on the invoice number, so redelivery of an already-applied event is
//! reported as a no-op instead of double-posting.

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;

use tradebook_core::EntryId;
use tradebook_events::{EventBus, EventEnvelope, EventHandler, InMemoryEventBus, Subscription};
use tradebook_inventory::{InventoryError, MovementKind, NewMovement};
use tradebook_journal::JournalError;
use tradebook_posting::{
    InvoiceEvent, InvoiceSnapshot, PostingAccounts, PostingError, cancellation_entry,
    emission_entry, payment_entry,
};

use crate::ledger::InventoryLedger;
use crate::journal_store::JournalStore;
use crate::registry::AccountRegistry;

/// Outcome of applying one invoice event to the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Posted(EntryId),
    /// The derived voucher already exists; the event was seen before.
    AlreadyApplied,
}

/// Posts the journal entry derived from each invoice event.
pub struct PostingHandler {
    registry: Arc<AccountRegistry>,
    journal: Arc<JournalStore>,
}

impl PostingHandler {
    pub fn new(registry: Arc<AccountRegistry>, journal: Arc<JournalStore>) -> Self {
        Self { registry, journal }
    }

    pub fn post(&self, event: &InvoiceEvent) -> Result<Applied, PostingError> {
        let accounts = self.registry.read(PostingAccounts::resolve)?;
        let entry = match event {
            InvoiceEvent::Emitted { invoice, .. } => emission_entry(invoice, &accounts)?,
            InvoiceEvent::Paid {
                invoice,
                method,
                occurred_at,
            } => payment_entry(invoice, *method, &accounts, occurred_at.date_naive())?,
            InvoiceEvent::Cancelled {
                invoice,
                reason,
                occurred_at,
            } => cancellation_entry(invoice, reason, &accounts, occurred_at.date_naive())?,
        };

        let voucher = entry.voucher.clone();
        match self.journal.create(entry) {
            Ok(posted) => Ok(Applied::Posted(posted.id)),
            Err(JournalError::DuplicateVoucher(v)) => {
                tracing::info!(voucher = %v, "event already posted, skipping");
                Ok(Applied::AlreadyApplied)
            }
            Err(other) => {
                tracing::warn!(
                    voucher = voucher.as_deref().unwrap_or("-"),
                    error = %other,
                    "posting derived entry failed"
                );
                Err(other.into())
            }
        }
    }
}

impl EventHandler<InvoiceEvent> for PostingHandler {
    type Error = anyhow::Error;

    fn name(&self) -> &'static str {
        "posting"
    }

    fn handle(&self, envelope: &EventEnvelope<InvoiceEvent>) -> Result<(), Self::Error> {
        let event = envelope.payload();
        self.post(event)
            .with_context(|| format!("posting invoice {}", event.invoice().number))?;
        Ok(())
    }
}

/// Outcome of applying one invoice event to the stock ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    /// Emission consumed stock for this many invoice lines.
    Consumed(usize),
    /// Cancellation returned stock for this many movements.
    Restored(usize),
    AlreadyApplied,
    /// The event kind has no stock effect (payment).
    NoStockEffect,
}

/// Consumes stock on emission and restores it on cancellation.
pub struct StockHandler {
    ledger: Arc<InventoryLedger>,
}

impl StockHandler {
    pub fn new(ledger: Arc<InventoryLedger>) -> Self {
        Self { ledger }
    }

    pub fn apply(&self, event: &InvoiceEvent) -> Result<StockOutcome, InventoryError> {
        match event {
            InvoiceEvent::Emitted { invoice, .. } => self.consume(invoice),
            InvoiceEvent::Cancelled { invoice, .. } => self.restore(invoice),
            InvoiceEvent::Paid { .. } => Ok(StockOutcome::NoStockEffect),
        }
    }

    /// Idempotency is keyed per (reference, product), not per invoice: a
    /// delivery whose Nth line fails leaves the earlier lines recorded, and
    /// the redelivery after the operator fixes the cause records only the
    /// lines still missing.
    fn consume(&self, invoice: &InvoiceSnapshot) -> Result<StockOutcome, InventoryError> {
        let reference = format!("INV-{}", invoice.number);
        let mut recorded = 0;
        for line in &invoice.lines {
            if self.ledger.has_reference_for(line.product_id, &reference) {
                tracing::info!(
                    reference = %reference,
                    product = %line.product_id,
                    "line already consumed, skipping"
                );
                continue;
            }
            // The snapshot carries no per-line sale price; the exit is
            // costed at the running average regardless, so the price field
            // stays zero.
            self.ledger.record(NewMovement::new(
                line.product_id,
                MovementKind::Exit,
                line.quantity,
                Decimal::ZERO,
                reference.clone(),
            ))?;
            recorded += 1;
        }
        if recorded == 0 {
            return Ok(StockOutcome::AlreadyApplied);
        }
        Ok(StockOutcome::Consumed(recorded))
    }

    fn restore(&self, invoice: &InvoiceSnapshot) -> Result<StockOutcome, InventoryError> {
        let reference = format!("CAN-{}", invoice.number);

        // Return exactly what the emission took out, cost-preserving: each
        // exit re-enters at the average cost it was consumed at, skipping
        // products whose compensation is already on the books.
        let consumed = self
            .ledger
            .movements_by_reference(&format!("INV-{}", invoice.number));
        let mut recorded = 0;
        let mut skipped = 0;
        for exit in consumed.iter().filter(|m| m.kind == MovementKind::Exit) {
            if self.ledger.has_reference_for(exit.product_id, &reference) {
                tracing::info!(
                    reference = %reference,
                    product = %exit.product_id,
                    "line already restored, skipping"
                );
                skipped += 1;
                continue;
            }
            self.ledger.record(NewMovement::new(
                exit.product_id,
                MovementKind::Entry,
                exit.quantity,
                exit.unit_cost,
                reference.clone(),
            ))?;
            recorded += 1;
        }
        if recorded == 0 && skipped > 0 {
            return Ok(StockOutcome::AlreadyApplied);
        }
        Ok(StockOutcome::Restored(recorded))
    }
}

impl EventHandler<InvoiceEvent> for StockHandler {
    type Error = anyhow::Error;

    fn name(&self) -> &'static str {
        "stock"
    }

    fn handle(&self, envelope: &EventEnvelope<InvoiceEvent>) -> Result<(), Self::Error> {
        let event = envelope.payload();
        self.apply(event)
            .with_context(|| format!("adjusting stock for invoice {}", event.invoice().number))?;
        Ok(())
    }
}

/// One handler failure surfaced by a pipeline drain.
#[derive(Debug)]
pub struct HandlerFailure {
    pub handler: &'static str,
    pub event_type: &'static str,
    pub error: anyhow::Error,
}

type BoxedHandler = Box<dyn EventHandler<InvoiceEvent, Error = anyhow::Error>>;

/// Wires the invoice event bus to its handlers and drives delivery.
///
/// Delivery is pull-based: `publish` enqueues, `drain` runs every pending
/// event through every handler. A handler failure never stops the others
/// and never rolls back what succeeded; all failures are returned to the
/// caller for operator attention.
pub struct InvoicePipeline {
    bus: Arc<InMemoryEventBus<EventEnvelope<InvoiceEvent>>>,
    subscription: Subscription<EventEnvelope<InvoiceEvent>>,
    handlers: Vec<BoxedHandler>,
}

impl InvoicePipeline {
    pub fn new(handlers: Vec<BoxedHandler>) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let subscription = bus.subscribe();
        Self {
            bus,
            subscription,
            handlers,
        }
    }

    /// Standard wiring: journal posting plus stock adjustment.
    pub fn standard(
        registry: Arc<AccountRegistry>,
        journal: Arc<JournalStore>,
        ledger: Arc<InventoryLedger>,
    ) -> Self {
        Self::new(vec![
            Box::new(StockHandler::new(ledger)),
            Box::new(PostingHandler::new(registry, journal)),
        ])
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus<EventEnvelope<InvoiceEvent>>> {
        Arc::clone(&self.bus)
    }

    pub fn publish(&self, event: InvoiceEvent) {
        // The in-memory bus only fails on lock poisoning; drop the event in
        // that case, consistent with best-effort fan-out.
        if self.bus.publish(EventEnvelope::wrap(event)).is_err() {
            tracing::error!("event bus is poisoned, event dropped");
        }
    }

    /// Deliver every pending event to every handler, collecting failures.
    pub fn drain(&self) -> Vec<HandlerFailure> {
        use tradebook_events::Event;

        let mut failures = Vec::new();
        while let Ok(envelope) = self.subscription.try_recv() {
            for handler in &self.handlers {
                if let Err(error) = handler.handle(&envelope) {
                    tracing::error!(
                        handler = handler.name(),
                        event_type = envelope.payload().event_type(),
                        error = %error,
                        "event handler failed"
                    );
                    failures.push(HandlerFailure {
                        handler: handler.name(),
                        event_type: envelope.payload().event_type(),
                        error,
                    });
                }
            }
        }
        failures
    }
}
