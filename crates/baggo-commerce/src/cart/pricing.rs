//! Product and cart pricing.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::ids::ProductId;
use crate::money::Money;

impl Product {
    /// Base price as money.
    pub fn base_price(&self) -> Money {
        Money::from_decimal(self.price.max(0.0))
    }

    /// Discount price, read from the product first and its stock record second.
    pub fn discount_price(&self) -> Option<Money> {
        self.discount_price
            .or(self.stock.discount_price)
            .filter(|p| p.is_finite())
            .map(Money::from_decimal)
    }

    /// Whether a discount applies: positive and strictly below the base price.
    pub fn has_discount(&self) -> bool {
        self.applicable_discount().is_some()
    }

    /// Price a customer pays per unit.
    pub fn unit_price(&self) -> Money {
        self.applicable_discount().unwrap_or_else(|| self.base_price())
    }

    fn applicable_discount(&self) -> Option<Money> {
        let base = self.base_price();
        self.discount_price()
            .filter(|discount| discount.is_positive() && *discount < base)
    }
}

/// Pricing breakdown for a single cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinePricing {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
    /// unit_price * quantity
    pub total: Money,
}

/// Pricing breakdown for a whole cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CartPricing {
    pub subtotal: Money,
    pub lines: Vec<LinePricing>,
}

impl CartPricing {
    /// Price each line and sum them.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = (&'a Product, u32)>) -> Self {
        let lines: Vec<LinePricing> = lines
            .into_iter()
            .map(|(product, quantity)| {
                let unit_price = product.unit_price();
                LinePricing {
                    product_id: product.id.clone(),
                    unit_price,
                    quantity,
                    total: unit_price * i64::from(quantity),
                }
            })
            .collect();
        let subtotal = Money::sum(lines.iter().map(|l| &l.total));
        Self { subtotal, lines }
    }
}
