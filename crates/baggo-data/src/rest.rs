//! REST implementation of [`RemoteBackend`] speaking the PostgREST dialect.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;

use crate::backend::{Filter, OrderBy, RemoteBackend, Row};
use crate::RemoteError;

const REST_PREFIX: &str = "rest/v1/";

/// HTTP client for a PostgREST-style table API.
///
/// Every request carries the anonymous API key both as `apikey` and as a
/// bearer token. Use [`RestBackend::new`] with the service root URL; tests
/// point it at a mock server.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: Url,
}

impl RestBackend {
    /// Create a client for the service rooted at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] if `url` does not parse or the key
    /// is not a valid header value, and [`RemoteError::Http`] if the
    /// underlying `reqwest::Client` cannot be constructed.
    pub fn new(url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        let normalised = format!("{}/{}", url.trim().trim_end_matches('/'), REST_PREFIX);
        let base_url = Url::parse(&normalised)
            .map_err(|e| RemoteError::InvalidUrl(format!("'{url}': {e}")))?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(anon_key.trim())
            .map_err(|e| RemoteError::InvalidUrl(format!("invalid API key header: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", anon_key.trim()))
            .map_err(|e| RemoteError::InvalidUrl(format!("invalid API key header: {e}")))?;
        headers.insert(HeaderName::from_static("apikey"), key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn table_url(&self, table: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(table)
            .map_err(|e| RemoteError::InvalidUrl(format!("table '{table}': {e}")))
    }

    fn request(&self, method: Method, table: &str, query: &[(&str, String)]) -> Result<RequestBuilder, RemoteError> {
        let mut url = self.table_url(table)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        tracing::debug!(%method, table, url = %url, "remote request");
        Ok(self.client.request(method, url))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: error_message(&body, status.as_u16()),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn eq_param(filter: &Filter) -> (&str, String) {
    (filter.column.as_str(), format!("eq.{}", filter.value_text()))
}

/// Pull the human-readable message out of a PostgREST error body.
fn error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error_description", "error", "hint"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn rows(value: Value) -> Result<Vec<Row>, RemoteError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()),
        Value::Object(map) => Ok(vec![map]),
        other => Err(RemoteError::ParseError(format!("expected rows, got {other}"))),
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>, RemoteError> {
        let (column, value) = eq_param(filter);
        let query = [
            ("select", "*".to_string()),
            (column, value),
            ("limit", "1".to_string()),
        ];
        let body = self.send(self.request(Method::GET, table, &query)?).await?;
        Ok(rows(body)?.into_iter().next())
    }

    async fn select_all(&self, table: &str, order: Option<&OrderBy>) -> Result<Vec<Row>, RemoteError> {
        let mut query = vec![("select", "*".to_string())];
        if let Some(order) = order {
            query.push(("order", format!("{}.{}", order.column, order.direction.as_str())));
        }
        let body = self.send(self.request(Method::GET, table, &query)?).await?;
        rows(body)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError> {
        let request = self
            .request(Method::POST, table, &[])?
            .header("Prefer", "return=representation")
            .json(&row);
        let body = self.send(request).await?;
        Ok(rows(body)?.into_iter().next().unwrap_or_default())
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<(), RemoteError> {
        let request = self
            .request(Method::PATCH, table, &[eq_param(filter)])?
            .json(&patch);
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), RemoteError> {
        self.send(self.request(Method::DELETE, table, &[eq_param(filter)])?)
            .await?;
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> Result<(), RemoteError> {
        let request = self
            .request(Method::POST, table, &[("on_conflict", on_conflict.to_string())])?
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row);
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> RestBackend {
        RestBackend::new(&server.uri(), "anon-key", 5).unwrap()
    }

    #[tokio::test]
    async fn test_select_one_sends_filter_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/promo_codes"))
            .and(query_param("code", "eq.SAVE10"))
            .and(query_param("limit", "1"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"code": "SAVE10", "value": 10}])),
            )
            .mount(&server)
            .await;

        let row = backend(&server)
            .select_one("promo_codes", &Filter::eq("code", "SAVE10"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("value"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_select_one_empty_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/promo_codes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let row = backend(&server)
            .select_one("promo_codes", &Filter::eq("code", "NOPE"))
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_select_all_orders_descending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/orders"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}, {"id": 1}])))
            .mount(&server)
            .await;

        let rows = backend(&server)
            .select_all("orders", Some(&OrderBy::desc("created_at")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_returns_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/orders"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"status": "new"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 7, "status": "new"}])))
            .mount(&server)
            .await;

        let mut row = Row::new();
        row.insert("status".to_string(), json!("new"));
        let stored = backend(&server).insert("orders", row).await.unwrap();
        assert_eq!(stored.get("id"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn test_upsert_uses_conflict_column() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/shipping_settings"))
            .and(query_param("on_conflict", "id"))
            .and(header("prefer", "resolution=merge-duplicates"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let mut row = Row::new();
        row.insert("id".to_string(), json!(1));
        backend(&server)
            .upsert("shipping_settings", row, "id")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_message_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/orders"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "message": "permission denied for table orders"
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .delete("orders", &Filter::eq("id", 1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table orders");
        assert!(matches!(err, RemoteError::Api { status: 403, .. }));
    }

    #[test]
    fn test_invalid_url() {
        let err = RestBackend::new("not a url", "k", 5).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl(_)));
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message("<html>", 502), "HTTP 502");
        assert_eq!(error_message(r#"{"message":""}"#, 500), "HTTP 500");
    }
}
