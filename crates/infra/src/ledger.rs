//! Per-product stock ledger over the costing fold.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use rust_decimal::Decimal;

use tradebook_core::ProductId;
use tradebook_inventory::{
    CostState, InventoryError, KardexFilter, KardexReport, NewMovement, Page, StockAvailability,
    StockMovement, replay,
};

use crate::sync;

/// Sink for derived stock levels, notified after each committed write.
///
/// Implementations must tolerate repeat notifications with the same value;
/// the ledger calls it at most once per recorded movement or recompute.
pub trait StockMirror: Send + Sync {
    fn mirror_stock(&self, product: ProductId, stock: i64);
}

/// Mirror that drops every notification.
pub struct NullMirror;

impl StockMirror for NullMirror {
    fn mirror_stock(&self, _product: ProductId, _stock: i64) {}
}

/// Append-only movement store with per-product serialization.
///
/// Each product owns its own mutex over its movement history, so writes to
/// different products never contend while writes to the same product are
/// strictly ordered. Derived state (stock on hand, weighted-average cost) is
/// read straight off the last movement, never stored separately.
pub struct InventoryLedger {
    products: RwLock<HashMap<ProductId, Arc<Mutex<Vec<StockMovement>>>>>,
    mirror: Arc<dyn StockMirror>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::with_mirror(Arc::new(NullMirror))
    }

    pub fn with_mirror(mirror: Arc<dyn StockMirror>) -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            mirror,
        }
    }

    fn history(&self, product: ProductId) -> Arc<Mutex<Vec<StockMovement>>> {
        if let Some(found) = sync::read(&self.products).get(&product) {
            return Arc::clone(found);
        }
        let mut products = sync::write(&self.products);
        Arc::clone(products.entry(product).or_default())
    }

    fn existing_history(&self, product: ProductId) -> Option<Arc<Mutex<Vec<StockMovement>>>> {
        sync::read(&self.products).get(&product).map(Arc::clone)
    }

    fn state_of(movements: &[StockMovement]) -> CostState {
        movements.last().map_or(CostState::EMPTY, |last| CostState {
            stock: last.stock_after,
            average_cost: last.unit_cost,
        })
    }

    /// Validate, cost, and append one movement.
    ///
    /// The check-then-append runs under the product's lock, so concurrent
    /// exits can never jointly overdraw the stock.
    pub fn record(&self, new: NewMovement) -> Result<StockMovement, InventoryError> {
        let history = self.history(new.product_id);
        let mut movements = sync::lock(&history);

        let state = Self::state_of(&movements);
        let (movement, next) = state.record(&new, Utc::now())?;
        movements.push(movement.clone());
        self.mirror.mirror_stock(new.product_id, next.stock);

        tracing::debug!(
            product = %movement.product_id,
            kind = ?movement.kind,
            quantity = movement.quantity,
            stock_after = movement.stock_after,
            "stock movement recorded"
        );
        Ok(movement)
    }

    /// Quantity on hand. A product with no movements has zero stock.
    pub fn current_stock(&self, product: ProductId) -> i64 {
        self.existing_history(product)
            .map_or(0, |h| Self::state_of(&sync::lock(&h)).stock)
    }

    /// Current weighted-average unit cost. Unlike stock, an average for a
    /// product with no history is meaningless, so this errors instead of
    /// defaulting.
    pub fn current_average_cost(&self, product: ProductId) -> Result<Decimal, InventoryError> {
        let history = self
            .existing_history(product)
            .ok_or(InventoryError::NoMovements(product))?;
        let movements = sync::lock(&history);
        if movements.is_empty() {
            return Err(InventoryError::NoMovements(product));
        }
        Ok(Self::state_of(&movements).average_cost)
    }

    /// Stock on hand times average cost.
    pub fn inventory_value(&self, product: ProductId) -> Result<Decimal, InventoryError> {
        let history = self
            .existing_history(product)
            .ok_or(InventoryError::NoMovements(product))?;
        let movements = sync::lock(&history);
        if movements.is_empty() {
            return Err(InventoryError::NoMovements(product));
        }
        Ok(Self::state_of(&movements).value())
    }

    /// Non-mutating availability check for a prospective outgoing quantity.
    /// Rejects non-positive quantities the same way `record` would.
    pub fn validate_stock(
        &self,
        product: ProductId,
        requested: i64,
    ) -> Result<StockAvailability, InventoryError> {
        if requested <= 0 {
            return Err(InventoryError::InvalidQuantity(requested));
        }
        let on_hand = self.current_stock(product);
        Ok(StockAvailability {
            product_id: product,
            requested,
            on_hand,
            remaining_after: on_hand - requested,
            sufficient: requested <= on_hand,
        })
    }

    /// Movement history in reverse chronological order, filtered and paged,
    /// with the live derived figures alongside.
    pub fn kardex(&self, product: ProductId, filter: KardexFilter, page: Page) -> KardexReport {
        let Some(history) = self.existing_history(product) else {
            return KardexReport {
                product_id: product,
                movements: Vec::new(),
                total: 0,
                current_stock: 0,
                average_cost: None,
                inventory_value: None,
            };
        };
        let movements = sync::lock(&history);
        let state = Self::state_of(&movements);

        let mut matching: Vec<StockMovement> = movements
            .iter()
            .filter(|m| filter.kind.is_none_or(|k| m.kind == k))
            .filter(|m| filter.from.is_none_or(|from| m.created_at >= from))
            .filter(|m| filter.to.is_none_or(|to| m.created_at <= to))
            .cloned()
            .collect();
        matching.sort_by_key(|m| std::cmp::Reverse((m.created_at, m.id)));

        let total = matching.len();
        let paged: Vec<StockMovement> = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();

        let derived = !movements.is_empty();
        KardexReport {
            product_id: product,
            movements: paged,
            total,
            current_stock: state.stock,
            average_cost: derived.then_some(state.average_cost),
            inventory_value: derived.then_some(state.value()),
        }
    }

    /// Replay the product's full history from zero, repairing any drift in
    /// the stored derived fields. Fails without committing if the history
    /// itself is inconsistent.
    pub fn recalculate(&self, product: ProductId) -> Result<CostState, InventoryError> {
        let history = self
            .existing_history(product)
            .ok_or(InventoryError::NoMovements(product))?;
        let mut movements = sync::lock(&history);
        if movements.is_empty() {
            return Err(InventoryError::NoMovements(product));
        }

        let state = replay(&mut movements)?;
        self.mirror.mirror_stock(product, state.stock);
        tracing::info!(
            product = %product,
            stock = state.stock,
            average_cost = %state.average_cost,
            "inventory history recomputed"
        );
        Ok(state)
    }

    /// Movements across all products carrying the given reference.
    pub fn movements_by_reference(&self, reference: &str) -> Vec<StockMovement> {
        let products = sync::read(&self.products);
        let mut found: Vec<StockMovement> = products
            .values()
            .flat_map(|h| {
                sync::lock(h)
                    .iter()
                    .filter(|m| m.reference == reference)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        found.sort_by_key(|m| (m.created_at, m.id));
        found
    }

    /// Whether any movement anywhere carries the given reference.
    pub fn has_reference(&self, reference: &str) -> bool {
        sync::read(&self.products)
            .values()
            .any(|h| sync::lock(h).iter().any(|m| m.reference == reference))
    }

    /// Whether one product's history carries the given reference. This is
    /// the per-line idempotency key: a multi-line write that failed midway
    /// can be re-driven and only the missing lines are recorded.
    pub fn has_reference_for(&self, product: ProductId, reference: &str) -> bool {
        self.existing_history(product)
            .is_some_and(|h| sync::lock(&h).iter().any(|m| m.reference == reference))
    }
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
