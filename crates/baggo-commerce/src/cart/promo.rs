//! Promo code validation.
//!
//! Promo rows come from a table whose columns were never pinned down, so
//! every attribute is read through an alias list. The discount computed
//! here is a preview; checkout recomputes it against the final subtotal
//! with [`AppliedPromo::discount_for`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use baggo_data::Filter;

use crate::backend::Backend;
use crate::coerce;
use crate::error::PromoError;
use crate::money::Money;

const PROMO_TABLE: &str = "promo_codes";

const ACTIVE_ALIASES: &[&str] = &["active", "is_active", "enabled"];
const EXPIRY_ALIASES: &[&str] = &["expires_at", "expiresAt", "expires"];
const KIND_ALIASES: &[&str] = &["type", "discount_type", "kind"];
const VALUE_ALIASES: &[&str] = &["value", "discount_value", "amount", "percent", "percentage"];

/// Kind token that triggers the magnitude heuristic.
const UNKNOWN_KIND: &str = "unknown";

/// How a promo value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoKind {
    /// Percentage of the subtotal.
    Percent,
    /// Fixed amount off.
    Fixed,
}

impl PromoKind {
    /// Classify a raw kind token.
    ///
    /// Tokens containing `fixed`, `amount` or `flat` are fixed unless they
    /// also mention `percent` or `%`. The literal `unknown` is guessed from
    /// the value: up to 100 is a percentage, anything larger a fixed amount.
    /// Everything else is a percentage.
    pub fn classify(raw: &str, value: f64) -> Self {
        let token = raw.trim().to_lowercase();
        if token == UNKNOWN_KIND {
            // Schema guess, not validation: a 150% code silently becomes 150 off.
            return if value <= 100.0 {
                PromoKind::Percent
            } else {
                PromoKind::Fixed
            };
        }
        let fixed = ["fixed", "amount", "flat"].iter().any(|t| token.contains(t));
        let percent = token.contains("percent") || token.contains('%');
        if fixed && !percent {
            PromoKind::Fixed
        } else {
            PromoKind::Percent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromoKind::Percent => "percent",
            PromoKind::Fixed => "fixed",
        }
    }
}

/// A promo row, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoCode {
    pub code: String,
    pub kind: PromoKind,
    /// Raw value; not yet checked for positivity.
    pub value: f64,
    pub expires_at: Option<DateTime<Utc>>,
    /// Only an explicit boolean counts.
    pub active: Option<bool>,
}

impl PromoCode {
    /// Normalize a promo row fetched for `code`.
    pub fn from_row(code: &str, row: &Map<String, Value>) -> Self {
        let value = coerce::to_number(coerce::pick(row, VALUE_ALIASES)).unwrap_or(0.0);
        let raw_kind = match coerce::pick(row, KIND_ALIASES) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => PromoKind::Percent.as_str().to_string(),
        };
        Self {
            code: code.to_string(),
            kind: PromoKind::classify(&raw_kind, value),
            value,
            expires_at: coerce::to_timestamp(coerce::pick(row, EXPIRY_ALIASES)),
            active: coerce::pick(row, ACTIVE_ALIASES).and_then(Value::as_bool),
        }
    }

    /// Check the code is usable at `now`.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), PromoError> {
        if self.active == Some(false) {
            return Err(PromoError::Inactive);
        }
        if self.expires_at.is_some_and(|at| at < now) {
            return Err(PromoError::Expired);
        }
        if !(self.value.is_finite() && self.value > 0.0) {
            return Err(PromoError::Invalid("Invalid promo value.".to_string()));
        }
        Ok(())
    }
}

/// Discount for `kind`/`value` against `subtotal`, clamped into `[0, subtotal]`.
pub fn discount_amount(kind: PromoKind, value: f64, subtotal: Money) -> Money {
    let raw = match kind {
        PromoKind::Fixed => Money::from_decimal(value),
        PromoKind::Percent => subtotal.percentage(value),
    };
    raw.clamp_between(Money::zero(), subtotal)
}

/// A validated promo code and its discount preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPromo {
    pub code: String,
    pub kind: PromoKind,
    pub value: f64,
    /// Preview against the subtotal passed to validation.
    pub discount: Money,
}

impl AppliedPromo {
    /// Recompute the discount against a (possibly changed) subtotal.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        discount_amount(self.kind, self.value, subtotal)
    }
}

/// Validates promo codes against the remote backend.
#[derive(Debug, Clone)]
pub struct PromoValidator {
    backend: Backend,
}

impl PromoValidator {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Validate `code` and preview its discount on `subtotal`.
    ///
    /// Issues at most one remote lookup; local mode never validates codes.
    pub async fn validate(&self, code: &str, subtotal: Money) -> Result<AppliedPromo, PromoError> {
        let Backend::Remote(remote) = &self.backend else {
            return Err(PromoError::Disabled);
        };

        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(PromoError::Invalid("Enter a promo code.".to_string()));
        }

        let row = remote
            .select_one(PROMO_TABLE, &Filter::eq("code", code.as_str()))
            .await
            .map_err(|e| {
                tracing::warn!(code = %code, error = %e, "promo lookup failed");
                PromoError::from(e)
            })?
            .ok_or(PromoError::NotFound)?;

        let promo = PromoCode::from_row(&code, &row);
        promo.check(Utc::now())?;

        let discount = discount_amount(promo.kind, promo.value, subtotal);
        tracing::debug!(code = %code, kind = promo.kind.as_str(), discount = %discount, "promo code accepted");

        Ok(AppliedPromo {
            code,
            kind: promo.kind,
            value: promo.value,
            discount,
        })
    }
}
