//! Inventory valuation domain module.
//!
//! Stock movements are an append-only sequence per product; running stock and
//! the weighted-average unit cost are a fold over that sequence. The fold is
//! exposed two ways only — appending one movement, and replaying the whole
//! history — so the derived state can never drift from the records.

pub mod costing;
pub mod movement;

pub use costing::{CostState, Costed, replay};
pub use movement::{
    InventoryError, KardexFilter, KardexReport, MovementDirection, MovementKind, NewMovement,
    Page, StockAvailability, StockMovement,
};
