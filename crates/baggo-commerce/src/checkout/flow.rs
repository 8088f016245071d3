//! Checkout: totals, order drafts and submission.
//!
//! The cart subtotal comes from line unit prices, the promo discount is
//! recomputed against that subtotal (the preview from validation may be
//! stale), and shipping comes from the settings gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::Outcome;
use crate::cart::{AppliedPromo, CartLine, CartStore};
use crate::checkout::{ConfigGateway, NewOrder, OrderGateway, OrderStatus, ShippingSettings};
use crate::error::GatewayError;
use crate::ids::{OrderId, ProductId};
use crate::money::Money;

/// The four order totals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    /// max(0, subtotal - discount) + shipping
    pub total: Money,
}

impl CheckoutTotals {
    /// Compute totals for `subtotal` with an optional promo and a shipping method.
    pub fn compute(
        subtotal: Money,
        promo: Option<&AppliedPromo>,
        settings: &ShippingSettings,
        method_code: Option<&str>,
    ) -> Self {
        let discount = promo
            .map(|p| p.discount_for(subtotal))
            .unwrap_or_default();
        let shipping = settings.fee_for(method_code, subtotal);
        let total = (subtotal - discount).max(Money::zero()) + shipping;
        Self {
            subtotal,
            discount,
            shipping,
            total,
        }
    }
}

/// Snapshot of one cart line stored on an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: ProductId,
    pub name: String,
    pub size: Option<String>,
    pub variant_index: Option<usize>,
    pub image: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.product.id.clone(),
            name: line.product.name.clone(),
            size: line.size.clone(),
            variant_index: line.variant_index,
            image: line.image.clone(),
            quantity: line.quantity,
            unit_price: line.product.unit_price(),
            line_total: line.total(),
        }
    }
}

/// What the shopper entered at checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    /// Customer details; passed through untouched.
    pub customer: Value,
    pub delivery_method: Option<String>,
    pub notes: String,
    pub promo: Option<AppliedPromo>,
}

impl OrderDraft {
    /// Assemble the order for `cart` under `settings`.
    pub fn build(&self, cart: &CartStore, settings: &ShippingSettings) -> NewOrder {
        let method = settings
            .select_method(self.delivery_method.as_deref())
            .map(|m| m.code.clone());
        let totals = CheckoutTotals::compute(
            cart.subtotal(),
            self.promo.as_ref(),
            settings,
            method.as_deref(),
        );
        let items = cart
            .lines()
            .iter()
            .map(OrderItem::from)
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect();

        NewOrder {
            status: OrderStatus::New,
            customer: match &self.customer {
                Value::Null => Value::Object(Default::default()),
                other => other.clone(),
            },
            items,
            promo_code: self.promo.as_ref().map(|p| p.code.clone()),
            delivery_method: method,
            notes: self.notes.trim().to_string(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            shipping: totals.shipping,
            total: totals.total,
        }
    }
}

/// Places orders: settings lookup, totals, submission.
#[derive(Debug, Clone)]
pub struct Checkout {
    config: ConfigGateway,
    orders: OrderGateway,
}

impl Checkout {
    pub fn new(config: ConfigGateway, orders: OrderGateway) -> Self {
        Self { config, orders }
    }

    /// Submit the cart as an order.
    ///
    /// Shipping settings fall back to the defaults when they cannot be
    /// fetched. The cart is left untouched; clearing it is the caller's call.
    pub async fn place_order(
        &self,
        cart: &CartStore,
        draft: &OrderDraft,
    ) -> Result<Outcome<OrderId>, GatewayError> {
        let settings = self.config.shipping_settings_or_default().await;
        let order = draft.build(cart, &settings);
        tracing::debug!(
            items = order.items.len(),
            subtotal = %order.subtotal,
            discount = %order.discount,
            shipping = %order.shipping,
            total = %order.total,
            "placing order"
        );
        self.orders.create_order(order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::PromoKind;
    use crate::catalog::Product;
    use baggo_cache::Cache;
    use serde_json::json;

    fn settings() -> ShippingSettings {
        ShippingSettings::from_value(&json!({
            "methods": [
                {"code": "courier", "label": "Courier", "fee": 10, "sort_order": 0},
                {"code": "pickup", "fee": 0, "sort_order": 1}
            ],
            "free_threshold": 200
        }))
    }

    fn percent(value: f64) -> AppliedPromo {
        AppliedPromo {
            code: "SAVE".into(),
            kind: PromoKind::Percent,
            value,
            discount: Money::zero(),
        }
    }

    fn money(amount: f64) -> Money {
        Money::from_decimal(amount)
    }

    #[test]
    fn test_totals_without_promo() {
        let totals = CheckoutTotals::compute(money(50.0), None, &settings(), Some("courier"));
        assert_eq!(totals.discount, Money::zero());
        assert_eq!(totals.shipping, money(10.0));
        assert_eq!(totals.total, money(60.0));
    }

    #[test]
    fn test_totals_recompute_discount() {
        let promo = percent(10.0);
        let totals = CheckoutTotals::compute(money(80.0), Some(&promo), &settings(), Some("pickup"));
        assert_eq!(totals.discount, money(8.0));
        assert_eq!(totals.total, money(72.0));
    }

    #[test]
    fn test_free_threshold_and_full_discount() {
        let fixed = AppliedPromo {
            code: "ALL".into(),
            kind: PromoKind::Fixed,
            value: 1000.0,
            discount: Money::zero(),
        };
        let totals = CheckoutTotals::compute(money(250.0), Some(&fixed), &settings(), Some("courier"));
        assert_eq!(totals.discount, money(250.0));
        assert_eq!(totals.shipping, Money::zero());
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_draft_build() {
        let mut cart = CartStore::load(Cache::in_memory(), "cart");
        let product = Product::from_value(json!({
            "id": "bag", "name": "Bag", "price": 30, "sizes": ["S"], "images": ["b.jpg"], "stock": {"S": 4}
        }));
        cart.quick_add(&product);
        cart.quick_add(&product);

        let draft = OrderDraft {
            customer: json!({"name": "Ada"}),
            delivery_method: Some("unknown-method".into()),
            notes: "  ring twice ".into(),
            promo: Some(percent(50.0)),
        };
        let order = draft.build(&cart, &settings());

        assert_eq!(order.delivery_method.as_deref(), Some("courier"));
        assert_eq!(order.subtotal, money(60.0));
        assert_eq!(order.discount, money(30.0));
        assert_eq!(order.shipping, money(10.0));
        assert_eq!(order.total, money(40.0));
        assert_eq!(order.promo_code.as_deref(), Some("SAVE"));
        assert_eq!(order.notes, "ring twice");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0]["quantity"], json!(2));
        assert_eq!(order.items[0]["line_total"], json!(60.0));
    }
}
