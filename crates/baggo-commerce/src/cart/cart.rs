//! Persisted shopping cart.

use serde::{Deserialize, Serialize};

use baggo_cache::Cache;

use crate::cart::CartPricing;
use crate::catalog::{Product, StockSelection};
use crate::ids::ProductId;
use crate::money::Money;

/// A cart line: a product snapshot plus the chosen size, variant and image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Product as it was when last added or refreshed.
    pub product: Product,
    pub size: Option<String>,
    /// `None` means no per-image variant is selected.
    pub variant_index: Option<usize>,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    /// Identity key of this line.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product.id.clone(),
            size: self.size.clone(),
            variant_index: self.variant_index,
            image: self.image.clone(),
        }
    }

    /// Stock ceiling for this line, computed from its snapshot.
    pub fn max_stock(&self) -> u32 {
        self.product
            .max_stock(self.size.as_deref().unwrap_or(""), self.variant_index)
    }

    /// Line total at the snapshot's unit price.
    pub fn total(&self) -> Money {
        self.product.unit_price() * i64::from(self.quantity)
    }

    fn clamp_quantity(&mut self, requested: i64) {
        let max = i64::from(self.max_stock());
        self.quantity = requested.min(max).max(1).try_into().unwrap_or(1);
    }
}

/// Identity of a cart line: (product, size, variant, image).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub variant_index: Option<usize>,
    pub image: String,
}

impl LineKey {
    /// Key for adding `product` with `selection`.
    pub fn new(product_id: ProductId, selection: &StockSelection) -> Self {
        Self {
            product_id,
            size: selection.size.clone(),
            variant_index: selection.variant_index,
            image: selection.image.clone(),
        }
    }

    /// Exact match on every component.
    fn is_same_line(&self, line: &CartLine) -> bool {
        self.product_id == line.product.id
            && self.size == line.size
            && self.variant_index == line.variant_index
            && self.image == line.image
    }

    /// Match used by remove and set-quantity: an empty image matches any image.
    fn targets(&self, line: &CartLine) -> bool {
        self.product_id == line.product.id
            && self.size == line.size
            && self.variant_index == line.variant_index
            && (self.image.is_empty() || self.image == line.image)
    }
}

/// Result of [`CartStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was created with quantity 1.
    Added,
    /// An existing line went up by one.
    Incremented,
    /// The line is already at its stock ceiling; nothing changed.
    AtLimit,
}

/// The shopping cart, persisted to the local store on every mutation.
///
/// Quantities are re-checked against stock on every write that touches a
/// line, so a stock reduction between two operations is enforced lazily.
/// Persistence is best effort: a failed write is logged and the in-memory
/// cart stays authoritative.
#[derive(Debug, Clone)]
pub struct CartStore {
    cache: Cache,
    key: String,
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Load the cart saved under `key`.
    ///
    /// Unreadable lines are dropped; data that is not a list loads as empty.
    pub fn load(cache: Cache, key: impl Into<String>) -> Self {
        let key = key.into();
        let lines: Vec<CartLine> = cache.get_list(&key);
        Self { cache, key, lines }
    }

    /// Write the cart to the local store.
    pub fn save(&self) {
        if let Err(e) = self.cache.set(&self.key, &self.lines) {
            tracing::warn!(key = %self.key, error = %e, "failed to persist cart");
        }
    }

    /// Add one unit of `product` with `selection`.
    ///
    /// The first unit is always accepted; later increments stop at the
    /// stock ceiling without error. The line's product snapshot is
    /// refreshed from `product`.
    pub fn add(&mut self, product: &Product, selection: &StockSelection) -> AddOutcome {
        let key = LineKey::new(product.id.clone(), selection);
        let max = product.max_stock(selection.size.as_deref().unwrap_or(""), selection.variant_index);

        let outcome = match self.lines.iter_mut().find(|l| key.is_same_line(l)) {
            Some(line) => {
                line.product = product.clone();
                if line.quantity >= max {
                    line.clamp_quantity(i64::from(line.quantity));
                    AddOutcome::AtLimit
                } else {
                    line.quantity += 1;
                    AddOutcome::Incremented
                }
            }
            None => {
                self.lines.push(CartLine {
                    product: product.clone(),
                    size: key.size,
                    variant_index: key.variant_index,
                    image: key.image,
                    quantity: 1,
                });
                AddOutcome::Added
            }
        };

        self.save();
        outcome
    }

    /// Add the first in-stock selection of `product`.
    pub fn quick_add(&mut self, product: &Product) -> AddOutcome {
        self.add(product, &product.pick_first_in_stock())
    }

    /// Remove lines matching `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !key.targets(l));
        let removed = self.lines.len() < before;
        if removed {
            self.save();
        }
        removed
    }

    /// Set the quantity of lines matching `key`, clamped into `[1, max stock]`.
    ///
    /// A line whose stock has dropped to zero keeps a quantity of 1; removal
    /// is left to the caller. Returns whether any line matched.
    pub fn set_quantity(&mut self, key: &LineKey, amount: i64) -> bool {
        let mut matched = false;
        for line in self.lines.iter_mut().filter(|l| key.targets(l)) {
            line.clamp_quantity(amount);
            matched = true;
        }
        if matched {
            self.save();
        }
        matched
    }

    /// Replace line snapshots with live product data and re-clamp quantities.
    ///
    /// Lines whose product is not in `products` are left as they are.
    pub fn refresh(&mut self, products: &[Product]) {
        for line in &mut self.lines {
            if let Some(live) = products.iter().find(|p| p.id == line.product.id) {
                line.product = live.clone();
                line.clamp_quantity(i64::from(line.quantity));
            }
        }
        self.save();
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.save();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> u32 {
        self.lines.iter().fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Per-line pricing and subtotal.
    pub fn pricing(&self) -> CartPricing {
        CartPricing::from_lines(self.lines.iter().map(|l| (&l.product, l.quantity)))
    }

    /// Sum of unit price times quantity over all lines.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.total())
    }
}
