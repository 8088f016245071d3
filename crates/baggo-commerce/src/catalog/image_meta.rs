//! Per-image display metadata.

use serde::Serialize;

use crate::catalog::{ImageCaption, Product, StockMode};

/// What a gallery shows for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMeta {
    pub url: String,
    pub index: usize,
    pub name: String,
    pub description: String,
}

fn caption_name(caption: &ImageCaption) -> &str {
    &caption.name
}

fn caption_description(caption: &ImageCaption) -> &str {
    &caption.description
}

/// Current caption, then base caption, then the product's own text.
fn resolve_text(
    current: Option<&ImageCaption>,
    base: Option<&ImageCaption>,
    read: fn(&ImageCaption) -> &str,
    own: &str,
) -> String {
    [current.map(read), base.map(read), Some(own)]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

impl Product {
    /// Resolve the caption for the image at `index` (clamped into range).
    ///
    /// Text falls back from the image's own caption, to the first caption,
    /// to the product itself. Per-image stock reads captions from its
    /// variants; legacy stock from its `__image_meta` list.
    pub fn image_meta(&self, index: usize) -> ImageMeta {
        let index = index.min(self.images.len().saturating_sub(1));

        let captions: Vec<&ImageCaption> = match &self.stock.mode {
            StockMode::PerImage { variants } => variants.iter().map(|v| &v.caption).collect(),
            StockMode::Legacy { image_meta, .. } => image_meta.iter().collect(),
        };
        let current = captions.get(index).copied();
        let base = captions.first().copied();

        ImageMeta {
            url: self.images.get(index).cloned().unwrap_or_default(),
            index,
            name: resolve_text(current, base, caption_name, &self.name),
            description: resolve_text(current, base, caption_description, &self.description),
        }
    }

    /// Position of `url` in the image list, or 0 when absent.
    pub fn image_index(&self, url: &str) -> usize {
        self.images.iter().position(|u| u == url).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_caption_applies_to_every_image() {
        let p = Product::from_value(json!({
            "name": "Bag",
            "description": "A bag",
            "images": ["a.jpg", "b.jpg", "c.jpg"],
            "stock": {
                "__mode": "per_image",
                "variants": [
                    {"name": "Classic", "stock": {}},
                    {"stock": {}},
                    {"name": "Night", "description": "Dark edition", "stock": {}}
                ]
            }
        }));

        let second = p.image_meta(1);
        assert_eq!(second.name, "Classic");
        assert_eq!(second.description, "A bag");

        let third = p.image_meta(2);
        assert_eq!(third.name, "Night");
        assert_eq!(third.description, "Dark edition");
        assert_eq!(third.url, "c.jpg");
    }

    #[test]
    fn test_index_is_clamped() {
        let p = Product::from_value(json!({"name": "Bag", "images": ["a.jpg", "b.jpg"]}));
        let meta = p.image_meta(10);
        assert_eq!(meta.index, 1);
        assert_eq!(meta.url, "b.jpg");
        assert_eq!(meta.name, "Bag");

        let empty = Product::from_value(json!({"name": "Bare"}));
        let meta = empty.image_meta(3);
        assert_eq!(meta.index, 0);
        assert_eq!(meta.url, "");
    }

    #[test]
    fn test_legacy_captions() {
        let p = Product::from_value(json!({
            "name": "Bag",
            "images": ["a.jpg", "b.jpg"],
            "stock": {"S": 1, "__image_meta": [{"name": "Front"}, {"name": "Back"}]}
        }));
        assert_eq!(p.image_meta(0).name, "Front");
        assert_eq!(p.image_meta(1).name, "Back");
    }

    #[test]
    fn test_image_index() {
        let p = Product::from_value(json!({"images": ["a.jpg", "b.jpg"]}));
        assert_eq!(p.image_index("b.jpg"), 1);
        assert_eq!(p.image_index("zzz.jpg"), 0);
    }
}
