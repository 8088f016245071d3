//! Product records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::StockRecord;
use crate::coerce;
use crate::ids::ProductId;

/// A catalog product, normalized at the data boundary.
///
/// Products are owned by the catalog service and read-only here. Loosely
/// typed fields are coerced once during deserialization: prices become
/// numbers, the `stock` field becomes a [`StockRecord`], and a lone `image`
/// field becomes a one-element image list. Unrecognized fields are kept in
/// `extra` so a cart snapshot carries them through unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ProductRecord", into = "ProductRecord")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Base price; never negative.
    pub price: f64,
    /// Discount price stored directly on the product, if valid.
    pub discount_price: Option<f64>,
    /// Declared size labels, in display order.
    pub sizes: Vec<String>,
    /// Image URLs; per-image variants align with these positionally.
    pub images: Vec<String>,
    pub stock: StockRecord,
    pub extra: Map<String, Value>,
}

impl Product {
    /// Parse a product from a loosely-typed JSON row.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value::<ProductRecord>(value)
            .map(Product::from)
            .unwrap_or_default()
    }

    /// First image URL, or empty.
    pub fn primary_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }
}

/// Wire shape of a product row.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProductRecord {
    #[serde(default)]
    id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discount_price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sizes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Value>,
    #[serde(default, skip_serializing)]
    image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stock: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .map(|v| coerce::to_text(Some(v)))
            .collect()
    })
}

impl From<ProductRecord> for Product {
    fn from(raw: ProductRecord) -> Self {
        let sizes = string_list(raw.sizes.as_ref())
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        let images = match string_list(raw.images.as_ref()) {
            Some(list) if !list.is_empty() => list,
            _ => coerce::to_optional_text(raw.image.as_ref())
                .map(|image| vec![image])
                .unwrap_or_default(),
        };

        Self {
            id: ProductId::from_value(&raw.id),
            name: coerce::to_text(raw.name.as_ref()),
            description: coerce::to_text(raw.description.as_ref()),
            price: coerce::to_number(raw.price.as_ref()).unwrap_or(0.0).max(0.0),
            discount_price: coerce::to_number(raw.discount_price.as_ref()),
            sizes,
            images,
            stock: raw
                .stock
                .as_ref()
                .map(StockRecord::from_value)
                .unwrap_or_default(),
            extra: raw.extra,
        }
    }
}

impl From<Product> for ProductRecord {
    fn from(product: Product) -> Self {
        let strings = |items: Vec<String>| Some(Value::Array(items.into_iter().map(Value::String).collect()));
        Self {
            id: Value::String(product.id.as_str().to_string()),
            name: Some(Value::String(product.name)),
            description: Some(Value::String(product.description)),
            price: Some(Value::from(product.price)),
            discount_price: product.discount_price.map(Value::from),
            sizes: strings(product.sizes),
            images: strings(product.images),
            image: None,
            stock: Some(product.stock.to_value()),
            extra: product.extra,
        }
    }
}
