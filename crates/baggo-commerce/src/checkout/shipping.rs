//! Shipping methods and the settings gateway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use baggo_data::Filter;

use crate::backend::{Backend, Outcome};
use crate::coerce;
use crate::error::GatewayError;
use crate::money::Money;

const SETTINGS_TABLE: &str = "shipping_settings";
/// The settings table holds a single row with this id.
const SETTINGS_ROW_ID: i64 = 1;
const DEFAULT_LABEL: &str = "Delivery";

/// A shipping method option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingMethod {
    /// Stable code stored on orders.
    pub code: String,
    /// Display label.
    pub label: String,
    /// Shipping fee.
    pub fee: Money,
    pub active: bool,
    pub sort_order: i64,
}

impl ShippingMethod {
    /// The built-in method used when nothing is configured.
    pub fn delivery() -> Self {
        Self {
            code: "delivery".to_string(),
            label: DEFAULT_LABEL.to_string(),
            fee: Money::zero(),
            active: true,
            sort_order: 0,
        }
    }

    /// Normalize one raw method entry. Entries without a code are dropped.
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object();
        let field = |name: &str| map.and_then(|m| m.get(name));

        let code = coerce::to_text(field("code"));
        if code.is_empty() {
            return None;
        }
        let label = coerce::to_optional_text(field("label")).unwrap_or_else(|| code.clone());
        Some(Self {
            label,
            fee: coerce::to_money(field("fee")),
            active: field("active").and_then(Value::as_bool) != Some(false),
            sort_order: coerce::to_number(field("sort_order")).map(|n| n as i64).unwrap_or(0),
            code,
        })
    }

    /// Check if this is free shipping.
    pub fn is_free(&self) -> bool {
        self.fee.is_zero()
    }
}

/// Normalize a raw methods list.
///
/// Codes are trimmed and empty ones dropped, fees coerced, labels default to
/// the code, and the list is stably sorted by `sort_order`. A value that is
/// not a list, or that normalizes to nothing, yields the default list.
pub fn normalize_methods(value: Option<&Value>) -> Vec<ShippingMethod> {
    let Some(Value::Array(items)) = value else {
        return vec![ShippingMethod::delivery()];
    };
    let mut methods: Vec<ShippingMethod> = items.iter().filter_map(ShippingMethod::from_value).collect();
    if methods.is_empty() {
        return vec![ShippingMethod::delivery()];
    }
    methods.sort_by_key(|m| m.sort_order);
    methods
}

/// Read an optional threshold; null, empty or non-numeric means none.
fn threshold(value: Option<&Value>) -> Option<Money> {
    coerce::to_number(value).map(Money::from_decimal)
}

/// Shipping configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingSettings {
    pub methods: Vec<ShippingMethod>,
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Option<Money>,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            methods: vec![ShippingMethod::delivery()],
            free_threshold: None,
        }
    }
}

impl ShippingSettings {
    /// Normalize a settings row or an admin form payload.
    pub fn from_value(value: &Value) -> Self {
        Self {
            methods: normalize_methods(value.get("methods")),
            free_threshold: threshold(value.get("free_threshold")),
        }
    }

    /// Re-apply normalization (trimmed codes, default labels, ordering).
    pub fn normalized(&self) -> Self {
        let methods = serde_json::to_value(&self.methods).unwrap_or(Value::Null);
        Self {
            methods: normalize_methods(Some(&methods)),
            free_threshold: self.free_threshold,
        }
    }

    /// Active methods in display order.
    pub fn active_methods(&self) -> impl Iterator<Item = &ShippingMethod> {
        self.methods.iter().filter(|m| m.active)
    }

    /// The active method with `code`, or the first active method.
    pub fn select_method(&self, code: Option<&str>) -> Option<&ShippingMethod> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        code.and_then(|c| self.active_methods().find(|m| m.code == c))
            .or_else(|| self.active_methods().next())
    }

    /// Fee for the selected method at `subtotal`, honoring the free threshold.
    pub fn fee_for(&self, code: Option<&str>, subtotal: Money) -> Money {
        if self.free_threshold.is_some_and(|t| subtotal >= t) {
            return Money::zero();
        }
        self.select_method(code).map(|m| m.fee).unwrap_or_default()
    }

    fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("id".to_string(), Value::from(SETTINGS_ROW_ID));
        row.insert(
            "methods".to_string(),
            serde_json::to_value(&self.methods).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        row.insert(
            "free_threshold".to_string(),
            self.free_threshold
                .map(|t| Value::from(t.to_decimal()))
                .unwrap_or(Value::Null),
        );
        row
    }
}

/// Reads and writes shipping settings.
///
/// Local mode serves the defaults and refuses writes.
#[derive(Debug, Clone)]
pub struct ConfigGateway {
    backend: Backend,
}

impl ConfigGateway {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Fetch the settings row, normalized. A missing row yields the defaults.
    pub async fn fetch_shipping_settings(&self) -> Result<Outcome<ShippingSettings>, GatewayError> {
        let remote = match &self.backend {
            Backend::Local(_) => return Ok(Outcome::local(ShippingSettings::default())),
            Backend::Remote(remote) => remote,
        };

        let row = remote
            .select_one(SETTINGS_TABLE, &Filter::eq("id", SETTINGS_ROW_ID))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to fetch shipping settings");
                GatewayError::from(e)
            })?;

        let settings = row
            .map(|r| ShippingSettings::from_value(&Value::Object(r)))
            .unwrap_or_default();
        Ok(Outcome::remote(settings))
    }

    /// Fetch settings, falling back to the defaults on any failure.
    pub async fn shipping_settings_or_default(&self) -> ShippingSettings {
        self.fetch_shipping_settings()
            .await
            .map(|outcome| outcome.data)
            .unwrap_or_default()
    }

    /// Normalize and upsert the settings row.
    pub async fn save_shipping_settings(
        &self,
        settings: &ShippingSettings,
    ) -> Result<Outcome<ShippingSettings>, GatewayError> {
        let remote = match &self.backend {
            Backend::Local(_) => {
                return Err(GatewayError::Unsupported(
                    "Shipping settings can only be saved when the remote backend is configured."
                        .to_string(),
                ))
            }
            Backend::Remote(remote) => remote,
        };

        let normalized = settings.normalized();
        remote
            .upsert(SETTINGS_TABLE, normalized.to_row(), "id")
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to save shipping settings");
                GatewayError::from(e)
            })?;

        tracing::info!(
            methods = normalized.methods.len(),
            free_threshold = ?normalized.free_threshold.map(|t| t.to_decimal()),
            "shipping settings saved"
        );
        Ok(Outcome::remote(normalized))
    }
}
