//! Items observed in a single search snapshot.

use serde::{Deserialize, Serialize};

/// A listed item as seen by one fetch.
///
/// Only `id` is ever persisted; the rest feeds the notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotItem {
    /// Stable catalog identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Current price bounds across variants
    pub price: PriceRange,

    /// Images, first one is the primary
    pub media: Vec<Media>,

    /// Token for the item's detail page
    pub detail_token: String,
}

impl SnapshotItem {
    /// Primary image, if any.
    pub fn primary_media(&self) -> Option<&Media> {
        self.media.first()
    }
}

/// Lowest and highest price of an item.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub from: f64,
    pub to: f64,
}

impl PriceRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// `$from - $to`, or `$from` when both bounds agree.
    pub fn display(&self) -> String {
        if self.from != self.to {
            format!("${} - ${}", self.from, self.to)
        } else {
            format!("${}", self.from)
        }
    }
}

/// An image reference. `base_url` may contain a `{{size}}` placeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub base_url: String,
    #[serde(default)]
    pub description: String,
}

impl Media {
    /// Resolve the image path for a concrete size.
    pub fn sized(&self, size: &str) -> String {
        self.base_url.replace("{{size}}", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_display() {
        assert_eq!(PriceRange::new(49.95, 49.95).display(), "$49.95");
        assert_eq!(PriceRange::new(20.0, 35.5).display(), "$20 - $35.5");
    }

    #[test]
    fn test_media_sized() {
        let media = Media {
            base_url: "images/12/{{size}}/shoe.jpg".into(),
            description: String::new(),
        };
        assert_eq!(media.sized("720x928"), "images/12/720x928/shoe.jpg");
    }
}
