//! Orders and the order gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use baggo_cache::Cache;
use baggo_data::{Filter, OrderBy};

use crate::backend::{Backend, Outcome};
use crate::coerce;
use crate::error::GatewayError;
use crate::ids::OrderId;
use crate::money::Money;

const ORDERS_TABLE: &str = "orders";

/// Order status.
///
/// Statuses written by other tools pass through as [`OrderStatus::Other`]
/// and serialize back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting processing.
    #[default]
    New,
    /// Order confirmed.
    Confirmed,
    /// Order being prepared.
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    /// A status this version does not know, kept as stored.
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Other(raw) => raw,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Other(raw) => raw,
        }
    }

    /// Parse one of the known statuses.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(OrderStatus::New),
            "confirmed" => Some(OrderStatus::Confirmed),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// Parse a stored status, keeping unknown values as they are.
    pub fn from_raw(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or_else(|| OrderStatus::Other(raw.to_string()))
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OrderStatus::from_raw(&raw))
    }
}

/// Order contents as submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NewOrder {
    pub status: OrderStatus,
    /// Customer details; opaque to the core and never logged.
    pub customer: Value,
    /// Line item snapshot.
    pub items: Vec<Value>,
    pub promo_code: Option<String>,
    pub delivery_method: Option<String>,
    pub notes: String,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
}

impl NewOrder {
    /// Normalize a loosely-typed order payload.
    ///
    /// Missing status becomes `new`, customer `{}`, non-list items `[]`,
    /// notes empty; totals are coerced to numbers.
    pub fn from_payload(payload: &Value) -> Self {
        let empty = Map::new();
        let map = payload.as_object().unwrap_or(&empty);
        let status = match map.get("status") {
            Some(Value::String(raw)) if !raw.trim().is_empty() => OrderStatus::from_raw(raw),
            other => coerce::to_optional_text(other)
                .map(|s| OrderStatus::from_raw(&s))
                .unwrap_or_default(),
        };
        let customer = match map.get("customer") {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(other) => other.clone(),
        };
        let items = match map.get("items") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        Self {
            status,
            customer,
            items,
            promo_code: coerce::to_optional_text(map.get("promo_code")),
            delivery_method: coerce::to_optional_text(map.get("delivery_method")),
            notes: coerce::to_text(map.get("notes")),
            subtotal: coerce::to_money(map.get("subtotal")),
            discount: coerce::to_money(map.get("discount")),
            shipping: coerce::to_money(map.get("shipping")),
            total: coerce::to_money(map.get("total")),
        }
    }

    fn to_row(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => row,
            _ => Map::new(),
        }
    }
}

/// A stored order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "Map<String, Value>")]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub details: NewOrder,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Map<String, Value>> for Order {
    fn from(row: Map<String, Value>) -> Self {
        Self {
            id: row.get("id").map(OrderId::from_value).unwrap_or_default(),
            created_at: coerce::to_timestamp(row.get("created_at")),
            details: NewOrder::from_payload(&Value::Object(row)),
        }
    }
}

/// Persists orders to the remote backend, or locally when there is none.
///
/// Local orders live in a list under one key of the durable store, newest
/// first. The two modes are never reconciled.
#[derive(Debug, Clone)]
pub struct OrderGateway {
    backend: Backend,
    local_key: String,
}

impl OrderGateway {
    pub fn new(backend: Backend, local_key: impl Into<String>) -> Self {
        Self {
            backend,
            local_key: local_key.into(),
        }
    }

    /// Entries that are not order objects are dropped with a warning; the
    /// rest of the list survives the next write.
    fn read_local(cache: &Cache, key: &str) -> Vec<Order> {
        cache.get_list(key)
    }

    fn write_local(cache: &Cache, key: &str, orders: &[Order]) -> Result<(), GatewayError> {
        cache.set(key, orders).map_err(|e| {
            tracing::warn!(key, error = %e, "failed to write local orders");
            GatewayError::from(e)
        })
    }

    /// Store a new order and return its identifier.
    pub async fn create_order(&self, order: NewOrder) -> Result<Outcome<OrderId>, GatewayError> {
        match &self.backend {
            Backend::Local(cache) => {
                let total = order.total;
                let stored = Order {
                    id: OrderId::generate_local(),
                    details: order,
                    created_at: Some(Utc::now()),
                };
                let id = stored.id.clone();
                let mut orders = Self::read_local(cache, &self.local_key);
                orders.insert(0, stored);
                Self::write_local(cache, &self.local_key, &orders)?;
                tracing::info!(order_id = %id, total = %total, "order stored locally");
                Ok(Outcome::local(id))
            }
            Backend::Remote(remote) => {
                let total = order.total;
                let row = remote.insert(ORDERS_TABLE, order.to_row()).await.map_err(|e| {
                    tracing::warn!(error = %e, "failed to create order");
                    GatewayError::from(e)
                })?;
                let id = row.get("id").map(OrderId::from_value).unwrap_or_default();
                tracing::info!(order_id = %id, total = %total, "order created");
                Ok(Outcome::remote(id))
            }
        }
    }

    /// All orders, newest first.
    pub async fn fetch_orders(&self) -> Result<Outcome<Vec<Order>>, GatewayError> {
        match &self.backend {
            Backend::Local(cache) => Ok(Outcome::local(Self::read_local(cache, &self.local_key))),
            Backend::Remote(remote) => {
                let rows = remote
                    .select_all(ORDERS_TABLE, Some(&OrderBy::desc("created_at")))
                    .await
                    .map_err(|e| {
                        tracing::warn!(error = %e, "failed to fetch orders");
                        GatewayError::from(e)
                    })?;
                Ok(Outcome::remote(rows.into_iter().map(Order::from).collect()))
            }
        }
    }

    /// Change the status of the order with `id`.
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Outcome<()>, GatewayError> {
        match &self.backend {
            Backend::Local(cache) => {
                let mut orders = Self::read_local(cache, &self.local_key);
                for order in orders.iter_mut().filter(|o| &o.id == id) {
                    order.details.status = status.clone();
                }
                Self::write_local(cache, &self.local_key, &orders)?;
                tracing::info!(order_id = %id, status = status.as_str(), "local order status updated");
                Ok(Outcome::local(()))
            }
            Backend::Remote(remote) => {
                let mut patch = Map::new();
                patch.insert("status".to_string(), Value::from(status.as_str()));
                remote
                    .update(ORDERS_TABLE, &Filter::eq("id", id.as_str()), patch)
                    .await
                    .map_err(|e| {
                        tracing::warn!(order_id = %id, error = %e, "failed to update order status");
                        GatewayError::from(e)
                    })?;
                tracing::info!(order_id = %id, status = status.as_str(), "order status updated");
                Ok(Outcome::remote(()))
            }
        }
    }

    /// Delete the order with `id`.
    pub async fn delete_order(&self, id: &OrderId) -> Result<Outcome<()>, GatewayError> {
        match &self.backend {
            Backend::Local(cache) => {
                let mut orders = Self::read_local(cache, &self.local_key);
                orders.retain(|o| &o.id != id);
                Self::write_local(cache, &self.local_key, &orders)?;
                tracing::info!(order_id = %id, "local order deleted");
                Ok(Outcome::local(()))
            }
            Backend::Remote(remote) => {
                remote
                    .delete(ORDERS_TABLE, &Filter::eq("id", id.as_str()))
                    .await
                    .map_err(|e| {
                        tracing::warn!(order_id = %id, error = %e, "failed to delete order");
                        GatewayError::from(e)
                    })?;
                tracing::info!(order_id = %id, "order deleted");
                Ok(Outcome::remote(()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baggo_data::MemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn sample() -> NewOrder {
        NewOrder::from_payload(&json!({
            "customer": {"name": "Ada", "phone": "555"},
            "items": [{"id": "bag", "quantity": 1}],
            "delivery_method": "delivery",
            "subtotal": 40,
            "discount": "4",
            "shipping": 0,
            "total": 36
        }))
    }

    #[test]
    fn test_payload_defaults() {
        let order = NewOrder::from_payload(&json!({"items": "nope", "total": "abc"}));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.customer, json!({}));
        assert!(order.items.is_empty());
        assert_eq!(order.promo_code, None);
        assert_eq!(order.notes, "");
        assert_eq!(order.total, Money::zero());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_value(&OrderStatus::Shipped).unwrap(), json!("shipped"));
        let status: OrderStatus = serde_json::from_value(json!("on_hold")).unwrap();
        assert_eq!(status, OrderStatus::Other("on_hold".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("on_hold"));
        assert_eq!(OrderStatus::from_str(" Cancelled "), Some(OrderStatus::Cancelled));
        assert!(OrderStatus::Refunded.is_terminal());
    }

    #[test]
    fn test_order_from_remote_row() {
        let order = Order::from(
            json!({
                "id": 9,
                "status": "shipped",
                "customer": null,
                "subtotal": "12.30",
                "created_at": "2026-04-01T08:00:00+00:00"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        assert_eq!(order.id.as_str(), "9");
        assert_eq!(order.details.status, OrderStatus::Shipped);
        assert_eq!(order.details.customer, json!({}));
        assert_eq!(order.details.subtotal, Money::from_decimal(12.3));
        assert!(order.created_at.is_some());
    }

    #[tokio::test]
    async fn test_local_create_and_fetch() {
        let cache = Cache::in_memory();
        let gateway = OrderGateway::new(Backend::Local(cache.clone()), "orders");

        let first = gateway.create_order(sample()).await.unwrap();
        assert!(first.local);
        assert!(first.data.as_str().starts_with("local-"));
        let second = gateway.create_order(sample()).await.unwrap();

        let fetched = gateway.fetch_orders().await.unwrap();
        assert!(fetched.local);
        assert_eq!(fetched.data.len(), 2);
        assert_eq!(fetched.data[0].id, second.data);
        assert_eq!(fetched.data[1].id, first.data);
        assert_eq!(fetched.data[1].details.total, Money::from_decimal(36.0));
        assert!(fetched.data[1].created_at.is_some());
    }

    #[tokio::test]
    async fn test_local_status_and_delete() {
        let gateway = OrderGateway::new(Backend::Local(Cache::in_memory()), "orders");
        let id = gateway.create_order(sample()).await.unwrap().data;

        let updated = gateway.update_order_status(&id, OrderStatus::Shipped).await.unwrap();
        assert!(updated.local);
        let orders = gateway.fetch_orders().await.unwrap().data;
        assert_eq!(orders[0].details.status, OrderStatus::Shipped);

        gateway.delete_order(&id).await.unwrap();
        assert!(gateway.fetch_orders().await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_remote_round_trip() {
        let remote = Arc::new(MemoryBackend::new());
        let gateway = OrderGateway::new(Backend::Remote(remote.clone()), "orders");

        let created = gateway.create_order(sample()).await.unwrap();
        assert!(!created.local);
        assert_eq!(created.data.as_str(), "1");

        let rows = remote.rows(ORDERS_TABLE);
        assert_eq!(rows[0]["status"], json!("new"));
        assert_eq!(rows[0]["discount"], json!(4.0));
        assert_eq!(rows[0]["customer"]["name"], json!("Ada"));

        gateway
            .update_order_status(&created.data, OrderStatus::Delivered)
            .await
            .unwrap();
        let orders = gateway.fetch_orders().await.unwrap();
        assert!(!orders.local);
        assert_eq!(orders.data[0].details.status, OrderStatus::Delivered);

        gateway.delete_order(&created.data).await.unwrap();
        assert!(remote.rows(ORDERS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_read_from_remote() {
        let remote = MemoryBackend::new().with_rows(
            ORDERS_TABLE,
            vec![json!({"id": 1, "status": "on_hold", "total": 10})],
        );
        let gateway = OrderGateway::new(Backend::remote(remote), "orders");

        let orders = gateway.fetch_orders().await.unwrap().data;
        assert_eq!(orders[0].details.status, OrderStatus::Other("on_hold".into()));
        assert_eq!(orders[0].details.status.as_str(), "on_hold");
    }

    #[tokio::test]
    async fn test_local_update_keeps_other_statuses() {
        let cache = Cache::in_memory();
        cache
            .set(
                "orders",
                &json!([{"id": "a", "status": "paid"}, {"id": "b", "status": "new"}]),
            )
            .unwrap();
        let gateway = OrderGateway::new(Backend::Local(cache.clone()), "orders");

        gateway
            .update_order_status(&OrderId::from("b"), OrderStatus::Shipped)
            .await
            .unwrap();

        let stored: Vec<Value> = cache.get("orders").unwrap().unwrap();
        assert_eq!(stored[0]["status"], json!("paid"));
        assert_eq!(stored[1]["status"], json!("shipped"));

        gateway.delete_order(&OrderId::from("b")).await.unwrap();
        let stored: Vec<Value> = cache.get("orders").unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["status"], json!("paid"));
    }

    #[tokio::test]
    async fn test_bad_local_entry_does_not_wipe_orders() {
        let cache = Cache::in_memory();
        cache
            .set("orders", &json!([{"id": "keep-me", "status": "confirmed", "total": 12}, null]))
            .unwrap();
        let gateway = OrderGateway::new(Backend::Local(cache), "orders");

        let created = gateway.create_order(NewOrder::default()).await.unwrap();

        let orders = gateway.fetch_orders().await.unwrap().data;
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, created.data);
        assert_eq!(orders[1].id.as_str(), "keep-me");
        assert_eq!(orders[1].details.status, OrderStatus::Confirmed);
        assert_eq!(orders[1].details.total, Money::from_decimal(12.0));
    }

    #[tokio::test]
    async fn test_remote_failure_is_returned() {
        let remote = MemoryBackend::new();
        remote.fail_with(Some("permission denied for table orders"));
        let gateway = OrderGateway::new(Backend::remote(remote), "orders");

        let err = gateway.create_order(sample()).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table orders");
        assert!(gateway.fetch_orders().await.is_err());
    }
}
