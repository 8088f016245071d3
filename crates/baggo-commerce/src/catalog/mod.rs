//! Product catalog module.
//!
//! Products, their two inventory encodings, and the stock and image
//! queries built on them.

mod image_meta;
mod inventory;
mod product;
mod stock;

pub use image_meta::ImageMeta;
pub use inventory::{ImageCaption, StockLevels, StockMode, StockRecord, Variant};
pub use product::Product;
pub use stock::{StockEntry, StockSelection};
