//! # Stock Rules
//!
//! Status derivation, quantity changes and ledger reconciliation for
//! inventory items.
//!
//! ## Status
//! ```text
//! quantity ≤ 0             → out_of_stock
//! quantity ≤ min_stock     → low_stock
//! otherwise                → active
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{InventoryMovement, InventoryStatus, MovementType};

/// Recomputes the status of an item from its quantity.
pub fn derive_status(quantity: i64, min_stock: i64) -> InventoryStatus {
    if quantity <= 0 {
        InventoryStatus::OutOfStock
    } else if quantity <= min_stock {
        InventoryStatus::LowStock
    } else {
        InventoryStatus::Active
    }
}

/// Applies a movement to a quantity on hand.
///
/// Outbound movements that would leave the item below zero are rejected.
pub fn apply_movement(
    item_name: &str,
    on_hand: i64,
    movement_type: MovementType,
    quantity: i64,
) -> CoreResult<i64> {
    let next = on_hand + movement_type.signed(quantity);
    if next < 0 {
        return Err(CoreError::InsufficientStock {
            item: item_name.to_string(),
            available: on_hand,
            requested: quantity,
        });
    }
    Ok(next)
}

/// Compares an item's quantity with the sum of its movement ledger.
///
/// Drift is reported, not corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LedgerReconciliation {
    pub item_id: String,
    pub quantity: i64,
    pub ledger_total: i64,
    pub movement_count: usize,
    /// quantity − ledger_total
    pub drift: i64,
    pub is_consistent: bool,
}

impl LedgerReconciliation {
    pub fn compute(item_id: &str, quantity: i64, movements: &[InventoryMovement]) -> Self {
        let ledger_total: i64 = movements
            .iter()
            .map(|m| m.movement_type.signed(m.quantity))
            .sum();
        let drift = quantity - ledger_total;
        LedgerReconciliation {
            item_id: item_id.to_string(),
            quantity,
            ledger_total,
            movement_count: movements.len(),
            drift,
            is_consistent: drift == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn movement(kind: MovementType, qty: i64) -> InventoryMovement {
        InventoryMovement {
            id: uuid::Uuid::new_v4().to_string(),
            item_id: "item".to_string(),
            movement_type: kind,
            quantity: qty,
            reason: "test".to_string(),
            related_record_type: None,
            related_record_id: None,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_derive_status() {
        assert_eq!(derive_status(0, 5), InventoryStatus::OutOfStock);
        assert_eq!(derive_status(-1, 0), InventoryStatus::OutOfStock);
        assert_eq!(derive_status(5, 5), InventoryStatus::LowStock);
        assert_eq!(derive_status(1, 0), InventoryStatus::Active);
        assert_eq!(derive_status(6, 5), InventoryStatus::Active);
    }

    #[test]
    fn test_apply_movement() {
        assert_eq!(apply_movement("Shampoo", 5, MovementType::Out, 5).unwrap(), 0);
        assert_eq!(apply_movement("Shampoo", 0, MovementType::In, 12).unwrap(), 12);

        let err = apply_movement("Shampoo", 2, MovementType::Out, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));
    }

    #[test]
    fn test_reconciliation() {
        let movements = vec![
            movement(MovementType::In, 20),
            movement(MovementType::Out, 3),
            movement(MovementType::Out, 2),
        ];
        let ok = LedgerReconciliation::compute("item", 15, &movements);
        assert!(ok.is_consistent);
        assert_eq!(ok.ledger_total, 15);
        assert_eq!(ok.movement_count, 3);

        let drifted = LedgerReconciliation::compute("item", 12, &movements);
        assert!(!drifted.is_consistent);
        assert_eq!(drifted.drift, -3);
    }
}
