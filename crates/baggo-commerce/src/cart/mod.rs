//! Shopping cart module.
//!
//! Contains the persisted cart, favourites, pricing and promo codes.

mod cart;
mod favorites;
mod pricing;
mod promo;

pub use cart::{AddOutcome, CartLine, CartStore, LineKey};
pub use favorites::FavoritesStore;
pub use pricing::{CartPricing, LinePricing};
pub use promo::{discount_amount, AppliedPromo, PromoCode, PromoKind, PromoValidator};
