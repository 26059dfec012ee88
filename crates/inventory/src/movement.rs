use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradebook_core::{Entity, ErrorKind, Fault, MovementId, ProductId, UserId};

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Goods received (purchase, return-in).
    Entry,
    /// Goods sold or otherwise dispatched.
    Exit,
    /// Loss, breakage, theft.
    Shrinkage,
    /// Upward correction. Downward corrections are modelled as shrinkage.
    Adjustment,
}

/// Whether a movement increases or decreases the quantity on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementDirection {
    Incoming,
    Outgoing,
}

impl MovementKind {
    pub fn direction(self) -> MovementDirection {
        match self {
            MovementKind::Entry | MovementKind::Adjustment => MovementDirection::Incoming,
            MovementKind::Exit | MovementKind::Shrinkage => MovementDirection::Outgoing,
        }
    }
}

/// One recorded change to a product's quantity on hand.
///
/// Append-only: movements are never updated or deleted. Corrections are new
/// movements, or a full-history recompute that overwrites the three stored
/// derived fields (`stock_before`, `stock_after`, `unit_cost`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    /// Always positive; the kind carries the direction.
    pub quantity: i64,
    /// Price at movement time: purchase price for incoming movements, sale
    /// price for outgoing ones.
    pub unit_price: Decimal,
    /// Weighted-average cost applicable to this movement. For outgoing
    /// movements this is the current average, never the sale price.
    pub unit_cost: Decimal,
    pub stock_before: i64,
    pub stock_after: i64,
    /// Free-text reference (document number, invoice voucher, notes).
    pub reference: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for recording a movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub reference: String,
    pub created_by: Option<UserId>,
}

impl NewMovement {
    pub fn new(
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
        unit_price: Decimal,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            kind,
            quantity,
            unit_price,
            reference: reference.into(),
            created_by: None,
        }
    }
}

/// Filters for the kardex query. All optional, combined with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KardexFilter {
    pub kind: Option<MovementKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// Per-product movement history plus the derived live figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KardexReport {
    pub product_id: ProductId,
    pub movements: Vec<StockMovement>,
    /// Total matching movements before pagination.
    pub total: usize,
    pub current_stock: i64,
    /// None when the product has no movements at all.
    pub average_cost: Option<Decimal>,
    pub inventory_value: Option<Decimal>,
}

/// Non-mutating availability check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAvailability {
    pub product_id: ProductId,
    pub requested: i64,
    pub on_hand: i64,
    /// `on_hand - requested`; negative when insufficient.
    pub remaining_after: i64,
    pub sufficient: bool,
}

/// Inventory valuation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("movement quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("unit price cannot be negative, got {0}")]
    NegativePrice(Decimal),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("product {0} has no movements")]
    NoMovements(ProductId),
}

impl Fault for InventoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::InvalidQuantity(_)
            | InventoryError::NegativePrice(_)
            | InventoryError::InsufficientStock { .. } => ErrorKind::Validation,
            InventoryError::NoMovements(_) => ErrorKind::MissingReference,
        }
    }
}
