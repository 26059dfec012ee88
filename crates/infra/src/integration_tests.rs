//! End-to-end flows across the registry, ledger, journal, and pipeline.

use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tradebook_core::{ErrorKind, Fault, ProductId};
use tradebook_inventory::{MovementKind, NewMovement};
use tradebook_posting::{
    InvoiceEvent, InvoiceLineSnapshot, InvoiceSnapshot, PaymentMethod, codes, standard_chart,
};

use crate::journal_store::JournalStore;
use crate::ledger::InventoryLedger;
use crate::pipeline::InvoicePipeline;
use crate::registry::AccountRegistry;

struct World {
    registry: Arc<AccountRegistry>,
    journal: Arc<JournalStore>,
    ledger: Arc<InventoryLedger>,
    pipeline: InvoicePipeline,
}

fn world() -> World {
    tradebook_observability::init();
    let registry = Arc::new(AccountRegistry::new());
    registry.seed(standard_chart().unwrap()).unwrap();
    let journal = Arc::new(JournalStore::new(registry.clone()));
    let ledger = Arc::new(InventoryLedger::new());
    let pipeline = InvoicePipeline::standard(registry.clone(), journal.clone(), ledger.clone());
    World {
        registry,
        journal,
        ledger,
        pipeline,
    }
}

fn stocked_product(ledger: &InventoryLedger, qty: i64, price: Decimal) -> ProductId {
    let product = ProductId::new();
    ledger
        .record(NewMovement::new(
            product,
            MovementKind::Entry,
            qty,
            price,
            "PO-SEED",
        ))
        .unwrap();
    product
}

fn invoice(number: &str, product: ProductId, quantity: i64) -> InvoiceSnapshot {
    InvoiceSnapshot {
        id: tradebook_core::InvoiceId::new(),
        number: number.to_string(),
        customer: "Acme Ltd".to_string(),
        emitted_on: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        subtotal: dec!(100.00),
        discount_total: Decimal::ZERO,
        tax_total: dec!(19.00),
        grand_total: dec!(119.00),
        lines: vec![InvoiceLineSnapshot {
            product_id: product,
            quantity,
        }],
    }
}

fn emitted(inv: &InvoiceSnapshot) -> InvoiceEvent {
    InvoiceEvent::Emitted {
        invoice: inv.clone(),
        occurred_at: Utc::now(),
    }
}

#[test]
fn emission_consumes_stock_and_posts_a_balanced_entry() {
    let w = world();
    let product = stocked_product(&w.ledger, 50, dec!(8.00));
    let inv = invoice("F-2024-0042", product, 10);

    w.pipeline.publish(emitted(&inv));
    let failures = w.pipeline.drain();
    assert!(failures.is_empty(), "{failures:?}");

    assert_eq!(w.ledger.current_stock(product), 40);
    let consumed = w.ledger.movements_by_reference("INV-F-2024-0042");
    assert_eq!(consumed.len(), 1);
    assert_eq!(consumed[0].kind, MovementKind::Exit);
    assert_eq!(consumed[0].unit_cost, dec!(8.00));

    let entry = w.journal.get_by_voucher("INV-F-2024-0042").unwrap();
    assert_eq!(entry.total_debit, dec!(119.00));
    assert_eq!(entry.total_credit, dec!(119.00));
    assert_eq!(entry.lines.len(), 3);

    let receivables = w
        .registry
        .get_by_code(&tradebook_accounts::AccountCode::new(codes::RECEIVABLES).unwrap())
        .unwrap();
    let activity = w.journal.account_balance(receivables.id, None).unwrap();
    assert_eq!(activity.balance, dec!(119.00));
}

#[test]
fn redelivered_events_are_applied_once() {
    let w = world();
    let product = stocked_product(&w.ledger, 50, dec!(8.00));
    let inv = invoice("F-2024-0043", product, 10);

    w.pipeline.publish(emitted(&inv));
    w.pipeline.publish(emitted(&inv));
    let failures = w.pipeline.drain();
    assert!(failures.is_empty(), "{failures:?}");

    assert_eq!(w.ledger.current_stock(product), 40);
    assert_eq!(w.ledger.movements_by_reference("INV-F-2024-0043").len(), 1);
    assert_eq!(w.journal.len(), 1);
}

#[test]
fn cancellation_restores_stock_and_mirrors_the_entry() {
    let w = world();
    let product = stocked_product(&w.ledger, 50, dec!(8.00));
    let inv = invoice("F-2024-0044", product, 10);

    w.pipeline.publish(emitted(&inv));
    w.pipeline.publish(InvoiceEvent::Cancelled {
        invoice: inv.clone(),
        reason: "customer returned goods".to_string(),
        occurred_at: Utc::now(),
    });
    let failures = w.pipeline.drain();
    assert!(failures.is_empty(), "{failures:?}");

    // Stock back where it started, at the same average cost.
    assert_eq!(w.ledger.current_stock(product), 50);
    assert_eq!(w.ledger.current_average_cost(product).unwrap(), dec!(8.00));
    let restored = w.ledger.movements_by_reference("CAN-F-2024-0044");
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].kind, MovementKind::Entry);
    assert_eq!(restored[0].unit_price, dec!(8.00));

    // The cancellation entry zeroes the receivable.
    let receivables = w
        .registry
        .get_by_code(&tradebook_accounts::AccountCode::new(codes::RECEIVABLES).unwrap())
        .unwrap();
    let activity = w.journal.account_balance(receivables.id, None).unwrap();
    assert_eq!(activity.balance, Decimal::ZERO);
    assert!(w.journal.get_by_voucher("CAN-F-2024-0044").is_some());
}

#[test]
fn payment_moves_the_receivable_into_the_settlement_account() {
    let w = world();
    let product = stocked_product(&w.ledger, 50, dec!(8.00));
    let inv = invoice("F-2024-0045", product, 10);

    w.pipeline.publish(emitted(&inv));
    w.pipeline.publish(InvoiceEvent::Paid {
        invoice: inv.clone(),
        method: PaymentMethod::BankTransfer,
        occurred_at: Utc::now(),
    });
    let failures = w.pipeline.drain();
    assert!(failures.is_empty(), "{failures:?}");

    // Payment has no stock effect.
    assert_eq!(w.ledger.current_stock(product), 40);

    let bank = w
        .registry
        .get_by_code(&tradebook_accounts::AccountCode::new(codes::BANK).unwrap())
        .unwrap();
    let receivables = w
        .registry
        .get_by_code(&tradebook_accounts::AccountCode::new(codes::RECEIVABLES).unwrap())
        .unwrap();
    assert_eq!(
        w.journal.account_balance(bank.id, None).unwrap().balance,
        dec!(119.00)
    );
    assert_eq!(
        w.journal
            .account_balance(receivables.id, None)
            .unwrap()
            .balance,
        Decimal::ZERO
    );
}

#[test]
fn insufficient_stock_fails_the_stock_handler_but_not_the_posting() {
    let w = world();
    let product = stocked_product(&w.ledger, 5, dec!(8.00));
    let inv = invoice("F-2024-0046", product, 10);

    w.pipeline.publish(emitted(&inv));
    let failures = w.pipeline.drain();

    // The stock handler fails and is surfaced; the posting handler still ran.
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].handler, "stock");
    assert_eq!(failures[0].event_type, "invoicing.invoice.emitted");
    assert_eq!(w.ledger.current_stock(product), 5);
    assert!(w.journal.get_by_voucher("INV-F-2024-0046").is_some());
}

#[test]
fn redelivery_after_a_partial_consume_records_the_missing_lines() {
    let w = world();
    let a = stocked_product(&w.ledger, 50, dec!(8.00));
    let b = stocked_product(&w.ledger, 5, dec!(8.00));
    let mut inv = invoice("F-2024-0049", a, 10);
    inv.lines.push(InvoiceLineSnapshot {
        product_id: b,
        quantity: 10,
    });

    // First delivery: line A goes through, line B is short on stock.
    w.pipeline.publish(emitted(&inv));
    let failures = w.pipeline.drain();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].handler, "stock");
    assert_eq!(w.ledger.current_stock(a), 40);
    assert_eq!(w.ledger.current_stock(b), 5);

    // Operator restocks B and the event is redelivered: only the missing
    // line is recorded; A is not consumed twice.
    w.ledger
        .record(NewMovement::new(
            b,
            MovementKind::Entry,
            20,
            dec!(8.00),
            "PO-RESTOCK",
        ))
        .unwrap();
    w.pipeline.publish(emitted(&inv));
    let failures = w.pipeline.drain();
    assert!(failures.is_empty(), "{failures:?}");
    assert_eq!(w.ledger.current_stock(a), 40);
    assert_eq!(w.ledger.current_stock(b), 15);
    assert_eq!(w.ledger.movements_by_reference("INV-F-2024-0049").len(), 2);

    // A third delivery with everything applied is a clean no-op.
    w.pipeline.publish(emitted(&inv));
    assert!(w.pipeline.drain().is_empty());
    assert_eq!(w.ledger.movements_by_reference("INV-F-2024-0049").len(), 2);
}

#[test]
fn missing_well_known_account_is_a_configuration_failure() {
    let registry = Arc::new(AccountRegistry::new());
    let journal = Arc::new(JournalStore::new(registry.clone()));
    let ledger = Arc::new(InventoryLedger::new());
    let pipeline = InvoicePipeline::standard(registry, journal.clone(), ledger.clone());

    let product = stocked_product(&ledger, 50, dec!(8.00));
    pipeline.publish(emitted(&invoice("F-2024-0047", product, 1)));
    let failures = pipeline.drain();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].handler, "posting");
    assert!(journal.is_empty());
}

#[test]
fn concurrent_exits_never_overdraw_a_product() {
    let ledger = Arc::new(InventoryLedger::new());
    let product = ProductId::new();
    ledger
        .record(NewMovement::new(
            product,
            MovementKind::Entry,
            100,
            dec!(1.00),
            "PO-1",
        ))
        .unwrap();

    let spawned: Vec<_> = (0..8)
        .map(|i| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                let mut accepted = 0i64;
                for _ in 0..25 {
                    let new = NewMovement::new(
                        product,
                        MovementKind::Exit,
                        1,
                        dec!(2.00),
                        format!("SO-{i}"),
                    );
                    if ledger.record(new).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let accepted: i64 = spawned.into_iter().map(|h| h.join().unwrap()).sum();
    // 200 attempts against 100 on hand: exactly the stock gets through.
    assert_eq!(accepted, 100);
    assert_eq!(ledger.current_stock(product), 0);

    // The recorded history replays cleanly and agrees.
    let state = ledger.recalculate(product).unwrap();
    assert_eq!(state.stock, 0);
}

#[test]
fn concurrent_posts_of_one_voucher_admit_a_single_entry() {
    let registry = Arc::new(AccountRegistry::new());
    registry.seed(standard_chart().unwrap()).unwrap();
    let journal = Arc::new(JournalStore::new(registry.clone()));
    let cash = registry
        .get_by_code(&tradebook_accounts::AccountCode::new(codes::CASH).unwrap())
        .unwrap();
    let revenue = registry
        .get_by_code(&tradebook_accounts::AccountCode::new(codes::SALES_REVENUE).unwrap())
        .unwrap();

    let spawned: Vec<_> = (0..8)
        .map(|_| {
            let journal = journal.clone();
            let (cash, revenue) = (cash.id, revenue.id);
            thread::spawn(move || {
                journal
                    .create(tradebook_journal::NewJournalEntry {
                        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                        voucher: Some("JE-RACE".to_string()),
                        description: "race".to_string(),
                        origin: None,
                        lines: vec![
                            tradebook_journal::NewEntryLine::debit(cash, dec!(10.00)),
                            tradebook_journal::NewEntryLine::credit(revenue, dec!(10.00)),
                        ],
                        created_by: None,
                    })
                    .is_ok()
            })
        })
        .collect();

    let wins = spawned
        .into_iter()
        .map(|h| h.join().unwrap_or(false))
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(journal.len(), 1);
}

#[test]
fn handler_failures_carry_the_fault_kind_through_anyhow() {
    let w = world();
    let product = stocked_product(&w.ledger, 1, dec!(8.00));
    let inv = invoice("F-2024-0048", product, 10);

    w.pipeline.publish(emitted(&inv));
    let failures = w.pipeline.drain();
    assert_eq!(failures.len(), 1);

    let inventory_err = failures[0]
        .error
        .downcast_ref::<tradebook_inventory::InventoryError>()
        .unwrap();
    assert_eq!(inventory_err.kind(), ErrorKind::Validation);
}
