//! Quantity-tiered pricing.

use crate::Taka;
use crate::model::Quantity;

/// `(minimum quantity, percent off)`, highest threshold first.
const DISCOUNT_TIERS: [(u8, u8); 2] = [(5, 8), (3, 5)];

/// Percent off for a given quantity: 8 from five jars, 5 from three, none below.
pub fn discount_percent(quantity: Quantity) -> u8 {
    DISCOUNT_TIERS
        .iter()
        .find(|(min, _)| quantity.get() >= *min)
        .map(|(_, pct)| *pct)
        .unwrap_or(0)
}

/// Derived price of a cart. Never stored on its own, always recomputed from its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: Taka,
    pub discount_percent: u8,
    pub discount_amount: Taka,
    pub total: Taka,
}

impl PriceBreakdown {
    /// Rounding happens once, on the discount; `total` is the exact difference.
    pub fn compute(unit_price: Taka, quantity: Quantity) -> Self {
        let subtotal = unit_price * u32::from(quantity.get());
        let discount_percent = discount_percent(quantity);
        let discount_amount = subtotal.percent(discount_percent);

        Self {
            subtotal,
            discount_percent,
            discount_amount,
            total: subtotal - discount_amount,
        }
    }

    pub fn has_discount(&self) -> bool {
        self.discount_percent > 0
    }
}
