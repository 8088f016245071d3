//! Stock queries over both inventory encodings.
//!
//! All queries are total: a missing size, a variant index out of range or
//! a malformed quantity resolves to zero.

use serde::{Deserialize, Serialize};

use crate::catalog::{Product, StockMode};

/// A (size, variant, image) choice for a product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockSelection {
    pub size: Option<String>,
    /// `None` means no per-image variant is selected.
    pub variant_index: Option<usize>,
    pub image: String,
}

/// One row of a flattened inventory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    pub size: String,
    pub quantity: u32,
    pub variant_index: Option<usize>,
    pub variant_name: Option<String>,
    pub image: String,
}

impl Product {
    /// Whether the product's stock uses the per-image encoding.
    pub fn is_per_image_mode(&self) -> bool {
        self.stock.is_per_image()
    }

    /// Units available for `size`.
    ///
    /// Legacy stock ignores `variant_index`. Per-image stock reads the
    /// selected variant, or the first one when none is selected.
    pub fn max_stock(&self, size: &str, variant_index: Option<usize>) -> u32 {
        let size = size.trim();
        if size.is_empty() {
            return 0;
        }
        match &self.stock.mode {
            StockMode::Legacy { levels, .. } => levels.get(size),
            StockMode::PerImage { variants } => variants
                .get(variant_index.unwrap_or(0))
                .map(|v| v.levels.get(size))
                .unwrap_or(0),
        }
    }

    /// Units of `size` across every variant.
    pub fn total_stock_for_size(&self, size: &str) -> u32 {
        let size = size.trim();
        if size.is_empty() {
            return 0;
        }
        match &self.stock.mode {
            StockMode::Legacy { levels, .. } => levels.get(size),
            StockMode::PerImage { variants } => variants
                .iter()
                .fold(0u32, |acc, v| acc.saturating_add(v.levels.get(size))),
        }
    }

    /// Units across every declared size. Sizeless products report zero.
    pub fn total_stock(&self) -> u32 {
        self.sizes
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(self.total_stock_for_size(s)))
    }

    /// Whether anything can be bought. Sizeless products always can.
    pub fn has_any_stock(&self) -> bool {
        self.sizes.is_empty() || self.sizes.iter().any(|s| self.total_stock_for_size(s) > 0)
    }

    /// Image shown for a variant, falling back to the first image.
    pub fn image_for_variant(&self, variant_index: usize) -> String {
        self.images
            .get(variant_index)
            .filter(|url| !url.is_empty())
            .map(String::as_str)
            .unwrap_or_else(|| self.primary_image())
            .to_string()
    }

    /// Deterministic selection for a quick add.
    ///
    /// Returns the first in-stock size (and, for per-image stock, the first
    /// in-stock variant of that size), or the first declared size when
    /// nothing is in stock. Only a sizeless product yields no size.
    pub fn pick_first_in_stock(&self) -> StockSelection {
        let Some(first_size) = self.sizes.first() else {
            return StockSelection {
                image: self.primary_image().to_string(),
                ..StockSelection::default()
            };
        };

        match &self.stock.mode {
            StockMode::PerImage { variants } => {
                let found = self.sizes.iter().find_map(|size| {
                    variants
                        .iter()
                        .position(|v| v.levels.get(size) > 0)
                        .map(|index| (size, index))
                });
                match found {
                    Some((size, index)) => StockSelection {
                        size: Some(size.clone()),
                        variant_index: Some(index),
                        image: self.image_for_variant(index),
                    },
                    None => StockSelection {
                        size: Some(first_size.clone()),
                        variant_index: Some(0),
                        image: self.primary_image().to_string(),
                    },
                }
            }
            StockMode::Legacy { levels, .. } => {
                let size = self
                    .sizes
                    .iter()
                    .find(|s| levels.get(s) > 0)
                    .unwrap_or(first_size);
                StockSelection {
                    size: Some(size.clone()),
                    variant_index: None,
                    image: self.primary_image().to_string(),
                }
            }
        }
    }

    /// Flattened listing for inventory displays.
    ///
    /// Per-image stock yields one row per (variant, size) pair in
    /// variant-then-size order; unnamed variants are labelled `Variant <n>`.
    pub fn list_stock_entries(&self) -> Vec<StockEntry> {
        match &self.stock.mode {
            StockMode::PerImage { variants } => variants
                .iter()
                .enumerate()
                .flat_map(|(index, variant)| {
                    let name = if variant.caption.name.is_empty() {
                        format!("Variant {}", index + 1)
                    } else {
                        variant.caption.name.clone()
                    };
                    let image = self.image_for_variant(index);
                    self.sizes.iter().map(move |size| StockEntry {
                        size: size.clone(),
                        quantity: variant.levels.get(size),
                        variant_index: Some(index),
                        variant_name: Some(name.clone()),
                        image: image.clone(),
                    })
                })
                .collect(),
            StockMode::Legacy { levels, .. } => self
                .sizes
                .iter()
                .map(|size| StockEntry {
                    size: size.clone(),
                    quantity: levels.get(size),
                    variant_index: None,
                    variant_name: None,
                    image: self.primary_image().to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy() -> Product {
        Product::from_value(json!({
            "id": "p1",
            "price": 100,
            "sizes": ["S", "M"],
            "images": ["a.jpg"],
            "stock": {"S": 2, "M": 0}
        }))
    }

    fn per_image() -> Product {
        Product::from_value(json!({
            "id": "p2",
            "sizes": ["S", "M"],
            "images": ["red.jpg", "blue.jpg"],
            "stock": {
                "__mode": "per_image",
                "variants": [
                    {"name": "Red", "stock": {"S": 0, "M": 1}},
                    {"stock": {"S": 3, "M": "2"}}
                ]
            }
        }))
    }

    #[test]
    fn test_legacy_max_stock_ignores_variant() {
        let p = legacy();
        assert_eq!(p.max_stock("S", None), 2);
        assert_eq!(p.max_stock("S", Some(5)), 2);
        assert_eq!(p.max_stock("M", None), 0);
        assert_eq!(p.max_stock(" S ", None), 2);
        assert_eq!(p.max_stock("", None), 0);
    }

    #[test]
    fn test_legacy_pick_first_in_stock() {
        let pick = legacy().pick_first_in_stock();
        assert_eq!(pick.size.as_deref(), Some("S"));
        assert_eq!(pick.variant_index, None);
        assert_eq!(pick.image, "a.jpg");
    }

    #[test]
    fn test_per_image_max_stock_defaults_to_first_variant() {
        let p = per_image();
        assert_eq!(p.max_stock("M", None), 1);
        assert_eq!(p.max_stock("S", Some(1)), 3);
        assert_eq!(p.max_stock("S", Some(9)), 0);
    }

    #[test]
    fn test_per_image_variant_sum_matches_total() {
        let p = per_image();
        for size in ["S", "M"] {
            let sum: u32 = (0..2).map(|i| p.max_stock(size, Some(i))).sum();
            assert_eq!(sum, p.total_stock_for_size(size));
        }
        assert_eq!(p.total_stock(), 6);
    }

    #[test]
    fn test_per_image_pick_first_in_stock() {
        let p = Product::from_value(json!({
            "sizes": ["S"],
            "images": ["one.jpg", "two.jpg"],
            "stock": {"__mode": "per_image", "variants": [{"stock": {"S": 0}}, {"stock": {"S": 3}}]}
        }));
        let pick = p.pick_first_in_stock();
        assert_eq!(pick.size.as_deref(), Some("S"));
        assert_eq!(pick.variant_index, Some(1));
        assert_eq!(pick.image, "two.jpg");
    }

    #[test]
    fn test_sold_out_falls_back_to_first_size() {
        let p = Product::from_value(json!({
            "sizes": ["S", "M"],
            "stock": {"__mode": "per_image", "variants": [{"stock": {}}]}
        }));
        let pick = p.pick_first_in_stock();
        assert_eq!(pick.size.as_deref(), Some("S"));
        assert_eq!(pick.variant_index, Some(0));
        assert!(!p.has_any_stock());
    }

    #[test]
    fn test_sizeless_product() {
        let p = Product::from_value(json!({"image": "solo.jpg"}));
        assert!(p.has_any_stock());
        assert_eq!(p.total_stock(), 0);
        let pick = p.pick_first_in_stock();
        assert_eq!(pick.size, None);
        assert_eq!(pick.variant_index, None);
        assert_eq!(pick.image, "solo.jpg");
        assert!(p.list_stock_entries().is_empty());
    }

    #[test]
    fn test_list_stock_entries_per_image() {
        let entries = per_image().list_stock_entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].variant_name.as_deref(), Some("Red"));
        assert_eq!(entries[1].size, "M");
        assert_eq!(entries[2].variant_name.as_deref(), Some("Variant 2"));
        assert_eq!(entries[2].image, "blue.jpg");
        assert_eq!(entries[3].quantity, 2);
    }

    #[test]
    fn test_list_stock_entries_legacy() {
        let entries = legacy().list_stock_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].quantity, 2);
        assert_eq!(entries[1].variant_index, None);
    }
}
