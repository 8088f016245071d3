//! Inventory records.
//!
//! A product's `stock` field arrives in one of two JSON encodings:
//!
//! - legacy: `{"S": 2, "M": 0}`, one size to quantity map per product
//! - per-image: `{"__mode": "per_image", "variants": [{"name", "description", "stock": {...}}]}`,
//!   one map per variant, aligned with the product's image list
//!
//! Either may carry `__discount_price`, and the legacy shape may carry
//! `__image_meta` captions. [`StockRecord::from_value`] decides the shape
//! once; everything downstream matches on [`StockMode`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::coerce;

const MODE_KEY: &str = "__mode";
const PER_IMAGE_MODE: &str = "per_image";
const VARIANTS_KEY: &str = "variants";
const DISCOUNT_KEY: &str = "__discount_price";
const IMAGE_META_KEY: &str = "__image_meta";

/// Quantities by size label. Always non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StockLevels(BTreeMap<String, u32>);

impl StockLevels {
    /// Build from a JSON object, coercing every quantity.
    ///
    /// Keys starting with `__` are markers, not sizes, and are skipped.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::default();
        };
        Self(
            map.iter()
                .filter(|(size, _)| !size.starts_with("__"))
                .map(|(size, qty)| (size.trim().to_string(), coerce::to_quantity(Some(qty))))
                .collect(),
        )
    }

    /// Quantity for `size`; unknown sizes have none.
    pub fn get(&self, size: &str) -> u32 {
        self.0.get(size).copied().unwrap_or(0)
    }

    /// Set the quantity for `size`.
    pub fn set(&mut self, size: impl Into<String>, quantity: u32) {
        self.0.insert(size.into(), quantity);
    }

    fn to_map(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(size, qty)| (size.clone(), Value::from(*qty)))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for StockLevels {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(s, q)| (s.into(), q)).collect())
    }
}

/// Optional display text attached to an image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageCaption {
    pub name: String,
    pub description: String,
}

impl ImageCaption {
    fn from_value(value: &Value) -> Self {
        let map = value.as_object();
        Self {
            name: coerce::to_text(map.and_then(|m| m.get("name"))),
            description: coerce::to_text(map.and_then(|m| m.get("description"))),
        }
    }

    fn write_into(&self, map: &mut Map<String, Value>) {
        if !self.name.is_empty() {
            map.insert("name".to_string(), Value::String(self.name.clone()));
        }
        if !self.description.is_empty() {
            map.insert("description".to_string(), Value::String(self.description.clone()));
        }
    }
}

/// One per-image variant: its caption and its own stock.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variant {
    pub caption: ImageCaption,
    pub levels: StockLevels,
}

impl Variant {
    fn from_value(value: &Value) -> Self {
        Self {
            caption: ImageCaption::from_value(value),
            levels: StockLevels::from_value(value.get("stock")),
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        self.caption.write_into(&mut map);
        map.insert("stock".to_string(), Value::Object(self.levels.to_map()));
        Value::Object(map)
    }
}

/// The two inventory encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockMode {
    /// One size map for the whole product, plus optional image captions.
    Legacy {
        levels: StockLevels,
        image_meta: Vec<ImageCaption>,
    },
    /// One variant per image.
    PerImage { variants: Vec<Variant> },
}

impl Default for StockMode {
    fn default() -> Self {
        StockMode::Legacy {
            levels: StockLevels::default(),
            image_meta: Vec::new(),
        }
    }
}

/// A parsed `stock` field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StockRecord {
    pub mode: StockMode,
    /// Discount price stored alongside the stock, if any.
    pub discount_price: Option<f64>,
}

impl StockRecord {
    /// Check whether a raw `stock` value uses the per-image encoding.
    pub fn is_per_image_value(value: &Value) -> bool {
        value.get(MODE_KEY).and_then(Value::as_str) == Some(PER_IMAGE_MODE)
            && value.get(VARIANTS_KEY).is_some_and(Value::is_array)
    }

    /// Parse a raw `stock` value. Never fails; garbage is empty legacy stock.
    pub fn from_value(value: &Value) -> Self {
        let discount_price = coerce::to_number(value.get(DISCOUNT_KEY));

        let mode = if Self::is_per_image_value(value) {
            let variants = value
                .get(VARIANTS_KEY)
                .and_then(Value::as_array)
                .map(|items| items.iter().map(Variant::from_value).collect())
                .unwrap_or_default();
            StockMode::PerImage { variants }
        } else {
            let image_meta = value
                .get(IMAGE_META_KEY)
                .and_then(Value::as_array)
                .map(|items| items.iter().map(ImageCaption::from_value).collect())
                .unwrap_or_default();
            StockMode::Legacy {
                levels: StockLevels::from_value(Some(value)),
                image_meta,
            }
        };

        Self {
            mode,
            discount_price,
        }
    }

    /// Encode back to the stored JSON shape.
    pub fn to_value(&self) -> Value {
        let mut map = match &self.mode {
            StockMode::Legacy { levels, image_meta } => {
                let mut map = levels.to_map();
                if !image_meta.is_empty() {
                    let captions = image_meta
                        .iter()
                        .map(|caption| {
                            let mut m = Map::new();
                            caption.write_into(&mut m);
                            Value::Object(m)
                        })
                        .collect();
                    map.insert(IMAGE_META_KEY.to_string(), Value::Array(captions));
                }
                map
            }
            StockMode::PerImage { variants } => {
                let mut map = Map::new();
                map.insert(MODE_KEY.to_string(), Value::from(PER_IMAGE_MODE));
                map.insert(
                    VARIANTS_KEY.to_string(),
                    Value::Array(variants.iter().map(Variant::to_value).collect()),
                );
                map
            }
        };
        if let Some(price) = self.discount_price {
            map.insert(DISCOUNT_KEY.to_string(), Value::from(price));
        }
        Value::Object(map)
    }

    /// Whether this record uses the per-image encoding.
    pub fn is_per_image(&self) -> bool {
        matches!(self.mode, StockMode::PerImage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_levels_are_coerced() {
        let record = StockRecord::from_value(&json!({"S": "3", "M": -1, "L": 2.7, "XL": "x"}));
        let StockMode::Legacy { levels, .. } = &record.mode else {
            panic!("expected legacy stock");
        };
        assert_eq!(levels.get("S"), 3);
        assert_eq!(levels.get("M"), 0);
        assert_eq!(levels.get("L"), 2);
        assert_eq!(levels.get("XL"), 0);
        assert_eq!(levels.get("XXL"), 0);
    }

    #[test]
    fn test_marker_keys_are_not_sizes() {
        let record = StockRecord::from_value(&json!({
            "S": 1,
            "__discount_price": 80,
            "__image_meta": [{"name": "Front"}]
        }));
        assert_eq!(record.discount_price, Some(80.0));
        let StockMode::Legacy { levels, image_meta } = &record.mode else {
            panic!("expected legacy stock");
        };
        assert_eq!(levels.get("__discount_price"), 0);
        assert_eq!(image_meta[0].name, "Front");
    }

    #[test]
    fn test_per_image_detection() {
        assert!(StockRecord::is_per_image_value(&json!({"__mode": "per_image", "variants": []})));
        assert!(!StockRecord::is_per_image_value(&json!({"__mode": "per_image"})));
        assert!(!StockRecord::is_per_image_value(&json!({"__mode": "legacy", "variants": []})));
        assert!(!StockRecord::is_per_image_value(&json!(null)));
    }

    #[test]
    fn test_per_image_variants_keep_position() {
        let record = StockRecord::from_value(&json!({
            "__mode": "per_image",
            "variants": [{"name": " Red ", "stock": {"S": 1}}, null, {"stock": {"S": 4}}]
        }));
        let StockMode::PerImage { variants } = &record.mode else {
            panic!("expected per-image stock");
        };
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].caption.name, "Red");
        assert_eq!(variants[1], Variant::default());
        assert_eq!(variants[2].levels.get("S"), 4);
    }

    #[test]
    fn test_encoding_keeps_shape() {
        let raw = json!({
            "__mode": "per_image",
            "variants": [{"name": "Red", "stock": {"S": 1}}],
            "__discount_price": 50.0
        });
        let record = StockRecord::from_value(&raw);
        assert_eq!(record.to_value(), raw);
        assert_eq!(StockRecord::from_value(&record.to_value()), record);
    }

    #[test]
    fn test_garbage_is_empty_legacy() {
        let record = StockRecord::from_value(&json!("lots"));
        assert_eq!(record, StockRecord::default());
        assert!(!record.is_per_image());
    }
}
