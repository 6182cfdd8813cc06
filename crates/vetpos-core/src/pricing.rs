//! # Bulk Price Adjustment
//!
//! Recomputes price and/or cost for a set of inventory items by a percentage
//! or a fixed amount, and summarizes the before/after totals.
//!
//! ```text
//! percent:  new = old × (100% ± value%)     rounded half up
//! fixed:    new = old ± value
//! both:     results never go below zero, nor above MAX_AMOUNT_CENTS
//! ```
//!
//! The same computation backs both the preview (nothing persisted) and the
//! apply operation (the repository writes `price_after` / `cost_after`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{round_div, Money};
use crate::types::{InventoryItem, InventoryStatus};
use crate::MAX_AMOUNT_CENTS;

/// Largest accepted percent increase (1000% = 11× the old amount).
pub const MAX_PERCENT_INCREASE: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdjustmentType {
    Percent,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

/// Which amounts the adjustment rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdjustmentTarget {
    #[default]
    Price,
    Cost,
    Both,
}

impl AdjustmentTarget {
    fn touches_price(&self) -> bool {
        matches!(self, AdjustmentTarget::Price | AdjustmentTarget::Both)
    }

    fn touches_cost(&self) -> bool {
        matches!(self, AdjustmentTarget::Cost | AdjustmentTarget::Both)
    }
}

/// Selects which items an adjustment applies to. Empty filter = all active items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemFilter {
    pub category: Option<String>,
    pub status: Option<InventoryStatus>,
    /// Case-insensitive substring of the item name.
    pub search: Option<String>,
    #[serde(default)]
    pub item_ids: Vec<String>,
}

/// An adjustment as requested by the user.
///
/// `value` is what the user typed: a percentage for `percent` (10 = 10%),
/// an amount in currency units for `fixed` (5.5 = $5.50).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceAdjustment {
    pub adjustment_type: AdjustmentType,
    pub direction: AdjustmentDirection,
    pub value: f64,
    #[serde(default)]
    pub target: AdjustmentTarget,
}

impl PriceAdjustment {
    /// Bounds: percent increase up to 1000%, percent decrease up to 100%,
    /// fixed up to [`MAX_AMOUNT_CENTS`] expressed in currency units.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "value".to_string(),
            });
        }
        let max = match (self.adjustment_type, self.direction) {
            (AdjustmentType::Percent, AdjustmentDirection::Increase) => MAX_PERCENT_INCREASE,
            (AdjustmentType::Percent, AdjustmentDirection::Decrease) => 100,
            (AdjustmentType::Fixed, _) => MAX_AMOUNT_CENTS / 100,
        };
        if self.value > max as f64 {
            return Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 0,
                max,
            });
        }
        Ok(())
    }

    /// Value in hundredths: basis points for percent, cents for fixed.
    /// Exact for validated values.
    fn hundredths(&self) -> i64 {
        (self.value * 100.0).round() as i64
    }

    /// Applies the adjustment to one amount, clamping at zero.
    ///
    /// Fails when the adjusted amount would exceed [`MAX_AMOUNT_CENTS`].
    pub fn apply_to(&self, amount: Money, field: &str) -> Result<Money, ValidationError> {
        let magnitude = self.hundredths();
        let signed = match self.direction {
            AdjustmentDirection::Increase => magnitude,
            AdjustmentDirection::Decrease => -magnitude,
        };
        let adjusted = match self.adjustment_type {
            AdjustmentType::Percent => amount.checked_scale_bps(signed),
            AdjustmentType::Fixed => amount.checked_add(Money::from_cents(signed)),
        }
        .map(|m| m.clamp_non_negative())
        .filter(|m| m.cents() <= MAX_AMOUNT_CENTS);

        adjusted.ok_or_else(|| ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        })
    }
}

/// Before/after amounts for one item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemPriceChange {
    pub item_id: String,
    pub name: String,
    pub price_before: Money,
    pub price_after: Money,
    pub cost_before: Money,
    pub cost_after: Money,
}

/// Totals and averages of one amount across the selected items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AggregateChange {
    pub total_before: Money,
    pub total_after: Money,
    pub average_before: Money,
    pub average_after: Money,
}

impl AggregateChange {
    /// Sums in `i128`; each amount is at most [`MAX_AMOUNT_CENTS`], so the
    /// totals only leave `i64` for absurd item counts, reported as an error.
    fn from_pairs(pairs: impl Iterator<Item = (Money, Money)>) -> Result<Self, ValidationError> {
        let mut count = 0i128;
        let mut before = 0i128;
        let mut after = 0i128;
        for (b, a) in pairs {
            count += 1;
            before += b.cents() as i128;
            after += a.cents() as i128;
        }
        Ok(AggregateChange {
            total_before: to_money(before)?,
            total_after: to_money(after)?,
            average_before: to_money(average(before, count))?,
            average_after: to_money(average(after, count))?,
        })
    }
}

fn average(total: i128, count: i128) -> i128 {
    if count == 0 {
        return 0;
    }
    round_div(total, count)
}

fn to_money(cents: i128) -> Result<Money, ValidationError> {
    i64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        })
}

/// Result of a preview or apply.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceAdjustmentSummary {
    pub item_count: usize,
    pub price: AggregateChange,
    pub cost: AggregateChange,
    pub changes: Vec<ItemPriceChange>,
}

/// Computes the adjustment for every item. Pure: nothing is persisted.
///
/// ```rust
/// use vetpos_core::pricing::*;
/// # use vetpos_core::types::{InventoryItem, InventoryStatus};
/// # let now = chrono::Utc::now();
/// # let item = InventoryItem {
/// #     id: "1".into(), name: "Collar".into(), category: "accessories".into(),
/// #     description: None, quantity: 3, min_stock: 1, status: InventoryStatus::Active,
/// #     price_cents: 10_000, cost_cents: 6_000, is_active: true,
/// #     created_at: now, updated_at: now,
/// # };
/// let adjustment = PriceAdjustment {
///     adjustment_type: AdjustmentType::Percent,
///     direction: AdjustmentDirection::Increase,
///     value: 10.0,
///     target: AdjustmentTarget::Price,
/// };
/// let summary = preview(&[item], &adjustment).unwrap();
/// assert_eq!(summary.price.average_after.cents(), 11_000);
/// ```
pub fn preview(
    items: &[InventoryItem],
    adjustment: &PriceAdjustment,
) -> Result<PriceAdjustmentSummary, ValidationError> {
    let target = adjustment.target;
    let changes = items
        .iter()
        .map(|item| {
            let price_before = item.price();
            let cost_before = item.cost();
            Ok(ItemPriceChange {
                item_id: item.id.clone(),
                name: item.name.clone(),
                price_before,
                price_after: if target.touches_price() {
                    adjustment.apply_to(price_before, &format!("price of {}", item.name))?
                } else {
                    price_before
                },
                cost_before,
                cost_after: if target.touches_cost() {
                    adjustment.apply_to(cost_before, &format!("cost of {}", item.name))?
                } else {
                    cost_before
                },
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(PriceAdjustmentSummary {
        item_count: changes.len(),
        price: AggregateChange::from_pairs(changes.iter().map(|c| (c.price_before, c.price_after)))?,
        cost: AggregateChange::from_pairs(changes.iter().map(|c| (c.cost_before, c.cost_after)))?,
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, price: i64, cost: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: id.to_string(),
            name: format!("Item {id}"),
            category: "medicine".to_string(),
            description: None,
            quantity: 10,
            min_stock: 2,
            status: InventoryStatus::Active,
            price_cents: price,
            cost_cents: cost,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn adjustment(kind: AdjustmentType, dir: AdjustmentDirection, value: f64, target: AdjustmentTarget) -> PriceAdjustment {
        PriceAdjustment {
            adjustment_type: kind,
            direction: dir,
            value,
            target,
        }
    }

    #[test]
    fn test_percent_increase_ten_on_hundred() {
        let adj = adjustment(AdjustmentType::Percent, AdjustmentDirection::Increase, 10.0, AdjustmentTarget::Price);
        let summary = preview(&[item("a", 10_000, 5_000)], &adj).unwrap();

        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.price.average_before.cents(), 10_000);
        assert_eq!(summary.price.average_after.cents(), 11_000);
        // Cost untouched when target is price
        assert_eq!(summary.cost.total_after.cents(), 5_000);
    }

    #[test]
    fn test_fixed_decrease_clamps_at_zero() {
        let adj = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Decrease, 30.0, AdjustmentTarget::Both);
        let summary = preview(&[item("a", 2_000, 1_000), item("b", 5_000, 4_000)], &adj).unwrap();

        let a = &summary.changes[0];
        assert_eq!(a.price_after.cents(), 0);
        assert_eq!(a.cost_after.cents(), 0);
        let b = &summary.changes[1];
        assert_eq!(b.price_after.cents(), 2_000);
        assert_eq!(b.cost_after.cents(), 1_000);

        assert_eq!(summary.price.total_before.cents(), 7_000);
        assert_eq!(summary.price.total_after.cents(), 2_000);
        assert_eq!(summary.price.average_after.cents(), 1_000);
    }

    #[test]
    fn test_average_rounds_half_up() {
        let adj = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, 0.0, AdjustmentTarget::Price);
        let summary = preview(&[item("a", 1, 0), item("b", 2, 0)], &adj).unwrap();
        // (1 + 2) / 2 = 1.5 → 2
        assert_eq!(summary.price.average_before.cents(), 2);
    }

    #[test]
    fn test_empty_selection() {
        let adj = adjustment(AdjustmentType::Percent, AdjustmentDirection::Decrease, 5.0, AdjustmentTarget::Cost);
        let summary = preview(&[], &adj).unwrap();
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.price, AggregateChange::default());
    }

    #[test]
    fn test_fractional_values() {
        let pct = adjustment(AdjustmentType::Percent, AdjustmentDirection::Increase, 12.5, AdjustmentTarget::Price);
        assert_eq!(pct.apply_to(Money::from_cents(8_000), "price").unwrap().cents(), 9_000);

        let fixed = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, 5.5, AdjustmentTarget::Price);
        assert_eq!(fixed.apply_to(Money::from_cents(1_000), "price").unwrap().cents(), 1_550);
    }

    #[test]
    fn test_validate() {
        let ok = adjustment(AdjustmentType::Percent, AdjustmentDirection::Decrease, 100.0, AdjustmentTarget::Price);
        assert!(ok.validate().is_ok());

        let too_much = adjustment(AdjustmentType::Percent, AdjustmentDirection::Decrease, 150.0, AdjustmentTarget::Price);
        assert!(too_much.validate().is_err());

        let negative = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, -1.0, AdjustmentTarget::Price);
        assert!(negative.validate().is_err());

        let nan = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, f64::NAN, AdjustmentTarget::Price);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_huge_values() {
        let fixed = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, 1e17, AdjustmentTarget::Price);
        assert!(matches!(fixed.validate(), Err(ValidationError::OutOfRange { .. })));

        let percent = adjustment(AdjustmentType::Percent, AdjustmentDirection::Increase, 1e16, AdjustmentTarget::Price);
        assert!(matches!(
            percent.validate(),
            Err(ValidationError::OutOfRange { max: MAX_PERCENT_INCREASE, .. })
        ));

        let largest = adjustment(
            AdjustmentType::Percent,
            AdjustmentDirection::Increase,
            MAX_PERCENT_INCREASE as f64,
            AdjustmentTarget::Price,
        );
        assert!(largest.validate().is_ok());
        assert_eq!(largest.apply_to(Money::from_cents(1_000), "price").unwrap().cents(), 11_000);
    }

    #[test]
    fn test_result_above_ceiling_is_rejected() {
        let adj = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, 10.0, AdjustmentTarget::Both);
        assert!(adj.validate().is_ok());

        let err = preview(&[item("a", MAX_AMOUNT_CENTS, 100)], &adj).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. }));

        // unvalidated input still cannot panic
        let raw = adjustment(AdjustmentType::Fixed, AdjustmentDirection::Increase, 1e17, AdjustmentTarget::Price);
        assert!(raw.apply_to(Money::from_cents(10_000), "price").is_err());
    }

    #[test]
    fn test_request_wire_format() {
        let adj: PriceAdjustment = serde_json::from_str(
            r#"{"adjustmentType":"percent","direction":"increase","value":10}"#,
        )
        .unwrap();
        assert_eq!(adj.target, AdjustmentTarget::Price);
        assert_eq!(adj.apply_to(Money::from_cents(10_000), "price").unwrap().cents(), 11_000);
    }
}
