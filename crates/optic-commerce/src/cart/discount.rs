//! First-time customer discount and display totals.
//!
//! Display only: the discount is never written to the cart. The backend
//! applies the real discount at checkout.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::money::Money;

pub const DEFAULT_FIRST_TIME_DISCOUNT_PERCENT: u32 = 20;

/// Percentage off the subtotal for a buyer's first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstTimeDiscount {
    pub percent: u32,
}

impl Default for FirstTimeDiscount {
    fn default() -> Self {
        Self {
            percent: DEFAULT_FIRST_TIME_DISCOUNT_PERCENT,
        }
    }
}

impl FirstTimeDiscount {
    pub fn new(percent: u32) -> Self {
        Self {
            percent: percent.min(100),
        }
    }

    /// Amount off `subtotal`, zero unless `is_first_time_customer`.
    pub fn amount(&self, subtotal: Money, is_first_time_customer: bool) -> Money {
        if is_first_time_customer && !subtotal.is_negative() {
            subtotal.percentage(self.percent)
        } else {
            Money::zero(subtotal.currency)
        }
    }
}

/// Totals shown next to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTotals {
    pub subtotal: Money,
    pub discount: Money,
    /// Subtotal minus the display discount.
    pub estimated_total: Money,
    pub tax: Option<Money>,
}

impl DisplayTotals {
    pub fn compute(cart: &Cart, discount: FirstTimeDiscount, is_first_time_customer: bool) -> Self {
        let subtotal = cart.cost.subtotal;
        let amount = discount.amount(subtotal, is_first_time_customer);
        let estimated_total = subtotal.try_subtract(&amount).unwrap_or(subtotal);
        Self {
            subtotal,
            discount: amount,
            estimated_total,
            tax: cart.cost.total_tax,
        }
    }

    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }
}
