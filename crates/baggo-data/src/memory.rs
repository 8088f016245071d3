//! In-memory implementation of [`RemoteBackend`] (for development/testing).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{Direction, Filter, OrderBy, RemoteBackend, Row};
use crate::RemoteError;

/// Tables held in process memory.
///
/// Inserts fill in an auto-increment `id` and a `created_at` timestamp when
/// the row does not carry them, mimicking database column defaults. A
/// failure can be injected with [`MemoryBackend::fail_with`] to exercise
/// error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    next_id: Mutex<i64>,
    failure: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with rows (builder style).
    pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Value>) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            let entry = tables.entry(table.to_string()).or_default();
            entry.extend(rows.into_iter().filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            }));
        }
        self
    }

    /// Make every subsequent call fail with `message` (or succeed again with `None`).
    pub fn fail_with(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = message.map(str::to_string);
        }
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Row>>>, RemoteError> {
        if let Some(message) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(RemoteError::Unavailable(message));
        }
        self.tables
            .lock()
            .map_err(|_| RemoteError::Unavailable("backend lock poisoned".to_string()))
    }

    fn allocate_id(&self) -> i64 {
        match self.next_id.lock() {
            Ok(mut next) => {
                *next += 1;
                *next
            }
            Err(_) => 0,
        }
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>, RemoteError> {
        let tables = self.guard()?;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| filter.matches(r)).cloned()))
    }

    async fn select_all(&self, table: &str, order: Option<&OrderBy>) -> Result<Vec<Row>, RemoteError> {
        let tables = self.guard()?;
        let mut rows = tables.get(table).cloned().unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, RemoteError> {
        let mut tables = self.guard()?;
        if !row.contains_key("id") {
            row.insert("id".to_string(), Value::from(self.allocate_id()));
        }
        if !row.contains_key("created_at") {
            row.insert(
                "created_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<(), RemoteError> {
        let mut tables = self.guard()?;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), RemoteError> {
        let mut tables = self.guard()?;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> Result<(), RemoteError> {
        let mut tables = self.guard()?;
        let rows = tables.entry(table.to_string()).or_default();
        let position = row
            .get(on_conflict)
            .map(|key| Filter::eq(on_conflict, key.clone()))
            .and_then(|filter| rows.iter().position(|r| filter.matches(r)));
        match position {
            Some(index) => {
                if let Some(target) = rows.get_mut(index) {
                    target.extend(row);
                }
            }
            None => rows.push(row),
        }
        Ok(())
    }
}
