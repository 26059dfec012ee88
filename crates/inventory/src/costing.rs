//! Weighted-average costing as a pure fold.
//!
//! `CostState` is the accumulator: quantity on hand and the current
//! weighted-average unit cost. Incoming movements shift the average;
//! outgoing movements consume at it and leave it untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::movement::{
    InventoryError, MovementDirection, MovementKind, NewMovement, StockMovement,
};

/// Running stock and weighted-average cost for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostState {
    pub stock: i64,
    pub average_cost: Decimal,
}

/// Result of folding one movement into a [`CostState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Costed {
    pub next: CostState,
    /// The weighted-average cost stamped on the movement itself.
    pub unit_cost: Decimal,
}

impl CostState {
    pub const EMPTY: CostState = CostState {
        stock: 0,
        average_cost: Decimal::ZERO,
    };

    /// Fold one movement into the state.
    ///
    /// Incoming (`Entry`/`Adjustment`):
    /// `new_cost = price` when stock is zero, otherwise
    /// `(stock·avg + qty·price) / (stock + qty)`.
    ///
    /// Outgoing (`Exit`/`Shrinkage`): rejected when `qty > stock`; costed at
    /// the current average, which stays unchanged.
    pub fn apply(
        &self,
        kind: MovementKind,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<Costed, InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity(quantity));
        }
        if unit_price < Decimal::ZERO {
            return Err(InventoryError::NegativePrice(unit_price));
        }

        match kind.direction() {
            MovementDirection::Incoming => {
                let qty = Decimal::from(quantity);
                let new_cost = if self.stock == 0 {
                    unit_price
                } else {
                    let held = Decimal::from(self.stock);
                    (held * self.average_cost + qty * unit_price) / (held + qty)
                };
                Ok(Costed {
                    next: CostState {
                        stock: self.stock + quantity,
                        average_cost: new_cost,
                    },
                    unit_cost: new_cost,
                })
            }
            MovementDirection::Outgoing => {
                if quantity > self.stock {
                    return Err(InventoryError::InsufficientStock {
                        requested: quantity,
                        available: self.stock,
                    });
                }
                Ok(Costed {
                    next: CostState {
                        stock: self.stock - quantity,
                        average_cost: self.average_cost,
                    },
                    unit_cost: self.average_cost,
                })
            }
        }
    }

    /// Quantity on hand times average cost.
    pub fn value(&self) -> Decimal {
        Decimal::from(self.stock) * self.average_cost
    }

    /// Stamp a new movement record from this state.
    pub fn record(
        &self,
        new: &NewMovement,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(StockMovement, CostState), InventoryError> {
        let costed = self.apply(new.kind, new.quantity, new.unit_price)?;
        let movement = StockMovement {
            id: tradebook_core::MovementId::new(),
            product_id: new.product_id,
            kind: new.kind,
            quantity: new.quantity,
            unit_price: new.unit_price,
            unit_cost: costed.unit_cost,
            stock_before: self.stock,
            stock_after: costed.next.stock,
            reference: new.reference.clone(),
            created_by: new.created_by,
            created_at,
        };
        Ok((movement, costed.next))
    }
}

/// Replay a product's full history from empty state, overwriting the stored
/// `stock_before`/`stock_after`/`unit_cost` fields deterministically.
///
/// Movements are processed in ascending creation order, ties broken by id
/// (UUIDv7, so the tie-break is itself time-ordered). On any error the input
/// is left untouched. Replaying twice yields identical records.
pub fn replay(movements: &mut Vec<StockMovement>) -> Result<CostState, InventoryError> {
    let mut order: Vec<usize> = (0..movements.len()).collect();
    order.sort_by_key(|&i| (movements[i].created_at, movements[i].id));

    // Compute into a scratch copy so a mid-history failure commits nothing.
    let mut recomputed: Vec<StockMovement> = Vec::with_capacity(movements.len());
    let mut state = CostState::EMPTY;
    for &i in &order {
        let m = &movements[i];
        let costed = state.apply(m.kind, m.quantity, m.unit_price)?;
        let mut fixed = m.clone();
        fixed.stock_before = state.stock;
        fixed.stock_after = costed.next.stock;
        fixed.unit_cost = costed.unit_cost;
        state = costed.next;
        recomputed.push(fixed);
    }

    *movements = recomputed;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tradebook_core::ProductId;

    fn entry(qty: i64, price: Decimal) -> (MovementKind, i64, Decimal) {
        (MovementKind::Entry, qty, price)
    }

    #[test]
    fn first_entry_sets_the_average_to_its_price() {
        let costed = CostState::EMPTY
            .apply(MovementKind::Entry, 100, dec!(10.00))
            .unwrap();
        assert_eq!(costed.next.stock, 100);
        assert_eq!(costed.next.average_cost, dec!(10.00));
        assert_eq!(costed.unit_cost, dec!(10.00));
    }

    #[test]
    fn entries_shift_the_weighted_average() {
        // 100 @ 10.00 then 50 @ 20.00 → (100·10 + 50·20) / 150.
        let s = CostState::EMPTY
            .apply(MovementKind::Entry, 100, dec!(10.00))
            .unwrap()
            .next;
        let s = s.apply(MovementKind::Entry, 50, dec!(20.00)).unwrap().next;

        assert_eq!(s.stock, 150);
        assert_eq!(s.average_cost, dec!(2000.00) / dec!(150));

        // A subsequent exit of 30 costs at that same average and leaves 120.
        let costed = s.apply(MovementKind::Exit, 30, dec!(35.00)).unwrap();
        assert_eq!(costed.unit_cost, dec!(2000.00) / dec!(150));
        assert_eq!(costed.next.stock, 120);
        assert_eq!(costed.next.average_cost, s.average_cost);
    }

    #[test]
    fn adjustment_is_incoming_and_shifts_the_average() {
        let s = CostState::EMPTY
            .apply(MovementKind::Entry, 10, dec!(4.00))
            .unwrap()
            .next;
        let s = s
            .apply(MovementKind::Adjustment, 10, dec!(6.00))
            .unwrap()
            .next;
        assert_eq!(s.stock, 20);
        assert_eq!(s.average_cost, dec!(5.00));
    }

    #[test]
    fn shrinkage_consumes_at_the_average() {
        let s = CostState::EMPTY
            .apply(MovementKind::Entry, 5, dec!(7.50))
            .unwrap()
            .next;
        let costed = s.apply(MovementKind::Shrinkage, 2, Decimal::ZERO).unwrap();
        assert_eq!(costed.unit_cost, dec!(7.50));
        assert_eq!(costed.next.stock, 3);
    }

    #[test]
    fn outgoing_beyond_stock_is_rejected() {
        let s = CostState::EMPTY
            .apply(MovementKind::Entry, 10, dec!(1.00))
            .unwrap()
            .next;
        let err = s.apply(MovementKind::Exit, 11, dec!(1.00)).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientStock {
                requested: 11,
                available: 10
            }
        );
    }

    #[test]
    fn zero_quantity_and_negative_price_are_rejected() {
        assert_eq!(
            CostState::EMPTY
                .apply(MovementKind::Entry, 0, dec!(1.00))
                .unwrap_err(),
            InventoryError::InvalidQuantity(0)
        );
        assert_eq!(
            CostState::EMPTY
                .apply(MovementKind::Entry, 1, dec!(-1.00))
                .unwrap_err(),
            InventoryError::NegativePrice(dec!(-1.00))
        );
    }

    #[test]
    fn draining_stock_then_restocking_resets_the_average() {
        let s = CostState::EMPTY
            .apply(MovementKind::Entry, 10, dec!(3.00))
            .unwrap()
            .next;
        let s = s.apply(MovementKind::Exit, 10, dec!(5.00)).unwrap().next;
        assert_eq!(s.stock, 0);

        let s = s.apply(MovementKind::Entry, 4, dec!(9.00)).unwrap().next;
        assert_eq!(s.average_cost, dec!(9.00));
    }

    fn history(specs: &[(MovementKind, i64, Decimal)]) -> Vec<StockMovement> {
        let product = ProductId::new();
        let t0 = Utc::now();
        let mut state = CostState::EMPTY;
        specs
            .iter()
            .enumerate()
            .map(|(i, &(kind, qty, price))| {
                let new = NewMovement::new(product, kind, qty, price, format!("doc-{i}"));
                let (m, next) = state
                    .record(&new, t0 + Duration::seconds(i as i64))
                    .unwrap();
                state = next;
                m
            })
            .collect()
    }

    #[test]
    fn replay_recomputes_drifted_fields() {
        let mut movements = history(&[
            entry(100, dec!(10.00)),
            entry(50, dec!(20.00)),
            (MovementKind::Exit, 30, dec!(35.00)),
        ]);
        let pristine = movements.clone();

        // Simulate historical drift.
        movements[1].unit_cost = dec!(99.99);
        movements[2].stock_after = -5;

        let state = replay(&mut movements).unwrap();
        assert_eq!(movements, pristine);
        assert_eq!(state.stock, 120);
        assert_eq!(state.average_cost, dec!(2000.00) / dec!(150));
    }

    #[test]
    fn replay_is_idempotent() {
        let mut movements = history(&[
            entry(8, dec!(2.50)),
            (MovementKind::Shrinkage, 3, Decimal::ZERO),
            entry(5, dec!(4.00)),
            (MovementKind::Exit, 6, dec!(6.00)),
        ]);

        replay(&mut movements).unwrap();
        let once = movements.clone();
        replay(&mut movements).unwrap();
        assert_eq!(movements, once);
    }

    #[test]
    fn replay_orders_by_time_then_id_and_fails_without_committing() {
        let product = ProductId::new();
        let t = Utc::now();
        let state = CostState::EMPTY;
        let (entry_m, after_entry) = state
            .record(
                &NewMovement::new(product, MovementKind::Entry, 5, dec!(1.00), "in"),
                t,
            )
            .unwrap();
        let (exit_m, _) = after_entry
            .record(
                &NewMovement::new(product, MovementKind::Exit, 5, dec!(2.00), "out"),
                t, // same instant: id order (v7, created later) breaks the tie
            )
            .unwrap();

        // Stored out of order; replay must still put the entry first.
        let mut movements = vec![exit_m.clone(), entry_m.clone()];
        replay(&mut movements).unwrap();
        assert_eq!(movements[0].id, entry_m.id);
        assert_eq!(movements[1].stock_after, 0);

        // An exit-only history cannot replay; input stays untouched.
        let mut broken = vec![exit_m];
        let snapshot = broken.clone();
        assert!(replay(&mut broken).is_err());
        assert_eq!(broken, snapshot);
    }

    proptest! {
        /// Property: whatever sequence of movements is accepted, stock never
        /// goes negative and every record's before/after arithmetic holds.
        #[test]
        fn accepted_histories_keep_stock_non_negative(
            ops in prop::collection::vec((0u8..4, 1i64..500, 0i64..10_000), 1..40)
        ) {
            let mut state = CostState::EMPTY;
            for (kind, qty, cents) in ops {
                let kind = match kind {
                    0 => MovementKind::Entry,
                    1 => MovementKind::Exit,
                    2 => MovementKind::Shrinkage,
                    _ => MovementKind::Adjustment,
                };
                let price = Decimal::new(cents, 2);
                if let Ok(costed) = state.apply(kind, qty, price) {
                    prop_assert!(costed.next.stock >= 0);
                    match kind.direction() {
                        MovementDirection::Incoming =>
                            prop_assert_eq!(costed.next.stock, state.stock + qty),
                        MovementDirection::Outgoing =>
                            prop_assert_eq!(costed.next.stock, state.stock - qty),
                    }
                    state = costed.next;
                } else {
                    // Rejections must not advance the fold.
                }
            }
        }

        /// Property: replay is deterministic and idempotent for any history
        /// the fold accepts.
        #[test]
        fn replay_twice_is_identity(
            ops in prop::collection::vec((prop::bool::ANY, 1i64..100, 1i64..5_000), 1..25)
        ) {
            let product = ProductId::new();
            let t0 = Utc::now();
            let mut state = CostState::EMPTY;
            let mut movements = Vec::new();
            for (i, (incoming, qty, cents)) in ops.into_iter().enumerate() {
                let kind = if incoming { MovementKind::Entry } else { MovementKind::Exit };
                let new = NewMovement::new(product, kind, qty, Decimal::new(cents, 2), "prop");
                if let Ok((m, next)) = state.record(&new, t0 + Duration::seconds(i as i64)) {
                    state = next;
                    movements.push(m);
                }
            }
            prop_assume!(!movements.is_empty());

            let mut replayed = movements.clone();
            replay(&mut replayed).unwrap();
            prop_assert_eq!(&replayed, &movements);
            replay(&mut replayed).unwrap();
            prop_assert_eq!(&replayed, &movements);
        }
    }
}
