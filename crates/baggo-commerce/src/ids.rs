//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing an OrderId where a ProductId is expected. Remote rows may
//! carry numeric identifiers; both kinds are normalized to their text form.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build an ID from a loosely-typed JSON value.
            pub fn from_value(value: &Value) -> Self {
                Self(id_text(value))
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Check whether the ID is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                Ok(Self::from_value(&value))
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);

impl OrderId {
    /// Generate an identifier for an order kept in the local store.
    ///
    /// Format: `local-<unix millis>-<random hex>`.
    pub fn generate_local() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!("local-{millis}-{suffix:x}"))
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("prod-123");
        assert_eq!(id.as_str(), "prod-123");
    }

    #[test]
    fn test_local_order_id_format() {
        let id = OrderId::generate_local();
        let parts: Vec<&str> = id.as_str().splitn(3, '-').collect();
        assert_eq!(parts[0], "local");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(u32::from_str_radix(parts[2], 16).is_ok());
        assert_ne!(OrderId::generate_local(), OrderId::generate_local());
    }

    #[test]
    fn test_id_from_numeric_value() {
        assert_eq!(ProductId::from_value(&json!(42)).as_str(), "42");
        assert_eq!(ProductId::from_value(&json!(" abc ")).as_str(), "abc");
        assert!(ProductId::from_value(&json!(null)).is_empty());

        let id: OrderId = serde_json::from_str("17").unwrap();
        assert_eq!(id.as_str(), "17");
    }

    #[test]
    fn test_id_display() {
        let id = ProductId::new("prod-789");
        assert_eq!(format!("{}", id), "prod-789");
    }
}
