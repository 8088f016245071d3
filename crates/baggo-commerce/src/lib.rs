//! Storefront consistency core for Baggo.
//!
//! This crate reconciles loosely-typed catalog data with strict numeric
//! rules:
//!
//! - **Catalog**: product records, both inventory encodings, stock and
//!   image-caption queries
//! - **Cart**: persisted cart capped by live stock, favourites, pricing,
//!   promo code validation
//! - **Checkout**: shipping settings, totals, orders, and the gateways that
//!   persist them to a remote backend or to the local store
//!
//! # Example
//!
//! ```rust,ignore
//! use baggo_commerce::prelude::*;
//!
//! let config = CommerceConfig::from_env();
//! let cache = config.open_cache()?;
//! let backend = Backend::from_config(&config, cache.clone())?;
//!
//! let mut cart = CartStore::load(cache, &config.keys.cart);
//! cart.quick_add(&product);
//!
//! let checkout = Checkout::new(
//!     ConfigGateway::new(backend.clone()),
//!     OrderGateway::new(backend, &config.keys.orders),
//! );
//! let placed = checkout.place_order(&cart, &OrderDraft::default()).await?;
//! println!("order {} (local: {})", placed.data, placed.local);
//! ```

pub mod admin;
pub mod backend;
pub mod coerce;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use backend::{Backend, Outcome};
pub use config::CommerceConfig;
pub use error::{CommerceError, GatewayError, PromoError};
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::admin::AdminGateway;
    pub use crate::backend::{Backend, Outcome};
    pub use crate::config::CommerceConfig;
    pub use crate::error::{CommerceError, GatewayError, PromoError};
    pub use crate::ids::*;
    pub use crate::money::Money;

    // Catalog
    pub use crate::catalog::{ImageMeta, Product, StockEntry, StockMode, StockRecord, StockSelection};

    // Cart
    pub use crate::cart::{
        AddOutcome, AppliedPromo, CartLine, CartPricing, CartStore, FavoritesStore, LineKey,
        PromoKind, PromoValidator,
    };

    // Checkout
    pub use crate::checkout::{
        Checkout, CheckoutTotals, ConfigGateway, NewOrder, Order, OrderDraft, OrderGateway,
        OrderStatus, ShippingMethod, ShippingSettings,
    };
}
