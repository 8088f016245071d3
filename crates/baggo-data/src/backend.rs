//! The remote backend contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::RemoteError;

/// A table row as returned by the backend.
pub type Row = serde_json::Map<String, Value>;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// Match rows where `column` equals `value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Filter value rendered the way it appears in a query string.
    pub fn value_text(&self) -> String {
        value_text(&self.value)
    }

    /// Check whether a row satisfies this filter.
    ///
    /// Values are compared by their text form so that a numeric `id` column
    /// matches a string identifier and vice versa.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .is_some_and(|v| v == &self.value || value_text(v) == self.value_text())
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// Ordering applied to a multi-row select.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }
}

/// Row-oriented access to the remote service.
///
/// Implementations are opaque request/response gateways; callers never
/// see transport details, only rows or a [`RemoteError`]. No retries are
/// performed at this layer.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Fetch at most one row matching `filter`.
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>, RemoteError>;

    /// Fetch every row of `table`, optionally ordered.
    async fn select_all(&self, table: &str, order: Option<&OrderBy>) -> Result<Vec<Row>, RemoteError>;

    /// Insert a row and return it as stored (including generated columns).
    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError>;

    /// Apply `patch` to every row matching `filter`.
    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<(), RemoteError>;

    /// Delete every row matching `filter`.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), RemoteError>;

    /// Insert `row`, or merge it into the existing row sharing `on_conflict`.
    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> Result<(), RemoteError>;
}
