//! # Sale Math
//!
//! Validation and totals for a sale before it reaches the database.
//!
//! ## Totals
//! ```text
//! line gross    = quantity × unit price
//! line total    = line gross − line discount
//!
//! subtotal      = Σ line gross
//! discount      = Σ line discount
//! tax           = tax(subtotal − discount)
//! total         = subtotal − discount + tax
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, TaxRate};
use crate::validation::{validate_non_negative_cents, validate_optional_text, validate_quantity, MAX_NOTE_LEN};
use crate::MAX_SALE_LINES;

/// One requested sale line, as submitted by the counter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineInput {
    #[serde(alias = "productId")]
    pub item_id: Option<String>,
    pub service_id: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

/// What a validated line points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTarget<'a> {
    Item(&'a str),
    Service(&'a str),
}

impl SaleLineInput {
    /// The referenced item or service. Fails unless exactly one is set.
    pub fn target(&self) -> Result<LineTarget<'_>, ValidationError> {
        match (self.item_id.as_deref(), self.service_id.as_deref()) {
            (Some(item), None) if !item.trim().is_empty() => Ok(LineTarget::Item(item)),
            (None, Some(service)) if !service.trim().is_empty() => Ok(LineTarget::Service(service)),
            _ => Err(ValidationError::ExactlyOne {
                first: "itemId".to_string(),
                second: "serviceId".to_string(),
            }),
        }
    }

    #[inline]
    pub fn gross(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.gross() - Money::from_cents(self.discount_cents)
    }

    fn validate(&self) -> CoreResult<()> {
        self.target()?;
        validate_quantity(self.quantity)?;
        validate_non_negative_cents(self.unit_price_cents, "unitPriceCents")?;
        validate_non_negative_cents(self.discount_cents, "discountCents")?;

        let gross = self.gross().cents();
        if self.discount_cents > gross {
            return Err(ValidationError::OutOfRange {
                field: "discountCents".to_string(),
                min: 0,
                max: gross,
            }
            .into());
        }
        Ok(())
    }
}

/// A sale request after identity has been attached by the API layer.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub client_id: Option<String>,
    pub pet_id: Option<String>,
    pub lines: Vec<SaleLineInput>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub user_id: Option<String>,
}

impl NewSale {
    /// Checks every rule that does not need the database.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptySale);
        }
        if self.lines.len() > MAX_SALE_LINES {
            return Err(CoreError::TooManyLines { max: MAX_SALE_LINES });
        }
        for line in &self.lines {
            line.validate()?;
        }
        validate_optional_text(&self.notes, "notes", MAX_NOTE_LEN)?;
        Ok(())
    }
}

/// Header amounts of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    pub fn compute(lines: &[SaleLineInput], tax_rate: TaxRate) -> Self {
        let subtotal: Money = lines.iter().map(SaleLineInput::gross).sum();
        let discount: Money = lines.iter().map(|l| Money::from_cents(l.discount_cents)).sum();
        let taxable = subtotal - discount;
        let tax = taxable.calculate_tax(tax_rate);

        SaleTotals {
            subtotal,
            discount,
            tax,
            total: taxable + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_AMOUNT_CENTS, MAX_LINE_QUANTITY};

    fn item_line(qty: i64, price: i64, discount: i64) -> SaleLineInput {
        SaleLineInput {
            item_id: Some("item-1".to_string()),
            service_id: None,
            quantity: qty,
            unit_price_cents: price,
            discount_cents: discount,
        }
    }

    fn sale(lines: Vec<SaleLineInput>) -> NewSale {
        NewSale {
            client_id: None,
            pet_id: None,
            lines,
            payment_method: PaymentMethod::Cash,
            notes: None,
            user_id: None,
        }
    }

    #[test]
    fn test_totals_without_tax() {
        let lines = vec![item_line(2, 15_000, 0), item_line(1, 5_000, 500)];
        let totals = SaleTotals::compute(&lines, TaxRate::zero());
        assert_eq!(totals.subtotal.cents(), 35_000);
        assert_eq!(totals.discount.cents(), 500);
        assert_eq!(totals.tax.cents(), 0);
        assert_eq!(totals.total.cents(), 34_500);
    }

    #[test]
    fn test_totals_tax_on_discounted_amount() {
        let lines = vec![item_line(1, 10_000, 1_000)];
        let totals = SaleTotals::compute(&lines, TaxRate::from_bps(1600));
        assert_eq!(totals.tax.cents(), 1_440);
        assert_eq!(totals.total.cents(), 10_440);
    }

    #[test]
    fn test_line_target() {
        let line = item_line(1, 100, 0);
        assert_eq!(line.target().unwrap(), LineTarget::Item("item-1"));

        let both = SaleLineInput {
            service_id: Some("svc".to_string()),
            ..item_line(1, 100, 0)
        };
        assert!(both.target().is_err());

        let neither = SaleLineInput {
            item_id: None,
            ..item_line(1, 100, 0)
        };
        assert!(neither.target().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sales() {
        assert!(matches!(sale(vec![]).validate(), Err(CoreError::EmptySale)));

        let too_many = sale(vec![item_line(1, 100, 0); MAX_SALE_LINES + 1]);
        assert!(matches!(too_many.validate(), Err(CoreError::TooManyLines { .. })));

        assert!(sale(vec![item_line(0, 100, 0)]).validate().is_err());
        assert!(sale(vec![item_line(1, -100, 0)]).validate().is_err());
        // Discount larger than the line
        assert!(sale(vec![item_line(2, 100, 201)]).validate().is_err());
        assert!(sale(vec![item_line(2, 100, 200)]).validate().is_ok());
    }

    #[test]
    fn test_huge_unit_price_is_a_validation_error() {
        let line = SaleLineInput {
            item_id: None,
            service_id: Some("svc-1".to_string()),
            quantity: 3,
            unit_price_cents: i64::MAX / 2,
            discount_cents: 0,
        };
        assert!(matches!(
            sale(vec![line]).validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_largest_valid_sale_totals_fit() {
        let lines = vec![item_line(MAX_LINE_QUANTITY, MAX_AMOUNT_CENTS, 0); MAX_SALE_LINES];
        assert!(sale(lines.clone()).validate().is_ok());

        let totals = SaleTotals::compute(&lines, TaxRate::from_bps(10_000));
        let subtotal = MAX_AMOUNT_CENTS * MAX_LINE_QUANTITY * MAX_SALE_LINES as i64;
        assert_eq!(totals.subtotal.cents(), subtotal);
        assert_eq!(totals.total.cents(), subtotal * 2);
    }

    #[test]
    fn test_line_input_wire_format() {
        let line: SaleLineInput = serde_json::from_str(
            r#"{"serviceId":"svc-1","quantity":1,"unitPriceCents":45000}"#,
        )
        .unwrap();
        assert_eq!(line.target().unwrap(), LineTarget::Service("svc-1"));
        assert_eq!(line.discount_cents, 0);
    }
}
