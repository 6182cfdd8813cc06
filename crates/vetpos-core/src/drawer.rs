//! # Drawer Reconciliation
//!
//! ```text
//! expected   = initial + Σ signed(transactions)
//! difference = final − expected        (negative ⇒ cash missing)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::CashTransaction;

/// Expected cash in the drawer given its opening amount and transactions.
pub fn expected_amount(initial: Money, transactions: &[CashTransaction]) -> Money {
    initial + transactions.iter().map(CashTransaction::signed_amount).sum::<Money>()
}

/// Figures recorded when a drawer closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DrawerReconciliation {
    pub initial: Money,
    pub transactions_total: Money,
    pub expected: Money,
    pub counted: Money,
    pub difference: Money,
}

impl DrawerReconciliation {
    pub fn compute(initial: Money, transactions: &[CashTransaction], counted: Money) -> Self {
        let expected = expected_amount(initial, transactions);
        DrawerReconciliation {
            initial,
            transactions_total: expected - initial,
            expected,
            counted,
            difference: counted - expected,
        }
    }

    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.difference.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use chrono::Utc;

    fn tx(kind: TransactionType, amount: i64) -> CashTransaction {
        CashTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            drawer_id: "drawer".to_string(),
            transaction_type: kind,
            amount_cents: amount,
            description: None,
            sale_id: None,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_difference_is_final_minus_expected() {
        let txs = vec![
            tx(TransactionType::Sale, 45_000),
            tx(TransactionType::Sale, 12_050),
            tx(TransactionType::Withdrawal, 20_000),
            tx(TransactionType::Deposit, 5_000),
            tx(TransactionType::Refund, 2_050),
        ];
        let rec = DrawerReconciliation::compute(Money::from_cents(100_000), &txs, Money::from_cents(139_000));

        assert_eq!(rec.transactions_total.cents(), 40_000);
        assert_eq!(rec.expected.cents(), 140_000);
        assert_eq!(rec.difference.cents(), -1_000);
        assert!(!rec.is_balanced());
    }

    #[test]
    fn test_empty_drawer_balances() {
        let rec = DrawerReconciliation::compute(Money::from_cents(50_000), &[], Money::from_cents(50_000));
        assert_eq!(rec.expected.cents(), 50_000);
        assert!(rec.is_balanced());
    }
}
