use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sites::SiteKind;

/// A product extracted from one site, normalized to the shape every
/// extractor converges on.
///
/// Optional fields that could not be located are omitted from serialized
/// output rather than written as `null`, and empty sequences are omitted
/// the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Site-specific identifier (ASIN, Flipkart id, Myntra style id).
    pub product_id: String,
    pub source_site: SiteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Region code derived from the final URL, e.g. `"in"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    /// List price before discount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrp: Option<f64>,
    /// Derived from `mrp` and `selling_price` by [`ProductRecord::finalize`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    /// Availability text exactly as the site renders it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Image URLs, primary image first, no duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
    /// Category trail ordered root to leaf.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizeOption>,
    /// `true` when the record came from the reduced fallback extraction.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_fallback: bool,
}

/// One purchasable size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOption {
    pub label: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku_id: Option<String>,
}

impl ProductRecord {
    /// Creates an otherwise empty record for `product_id` on `source_site`.
    #[must_use]
    pub fn new(product_id: impl Into<String>, source_site: SiteKind) -> Self {
        Self {
            product_id: product_id.into(),
            source_site,
            url: None,
            region: None,
            name: None,
            brand: None,
            selling_price: None,
            mrp: None,
            discount_percent: None,
            average_rating: None,
            rating_count: None,
            availability: None,
            in_stock: None,
            description: None,
            features: Vec::new(),
            images: Vec::new(),
            specifications: BTreeMap::new(),
            categories: Vec::new(),
            sizes: Vec::new(),
            is_fallback: false,
        }
    }

    /// Derives `discount_percent` from the two price fields. Called once by
    /// every extractor after both prices are known.
    #[must_use]
    pub fn finalize(mut self) -> Self {
        self.discount_percent = discount_percent(self.mrp, self.selling_price);
        self
    }

    /// The first image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Labels of the sizes currently marked available.
    #[must_use]
    pub fn available_sizes(&self) -> Vec<&str> {
        self.sizes
            .iter()
            .filter(|s| s.available)
            .map(|s| s.label.as_str())
            .collect()
    }
}

/// `round((mrp - selling) / mrp * 100, 2)` when both prices are present and
/// `mrp > 0`; `None` otherwise.
///
/// A selling price above the list price yields a negative value; it is not
/// clamped.
#[must_use]
pub fn discount_percent(mrp: Option<f64>, selling_price: Option<f64>) -> Option<f64> {
    let (mrp, selling) = (mrp?, selling_price?);
    if mrp <= 0.0 || !mrp.is_finite() || !selling.is_finite() {
        return None;
    }
    Some(round2((mrp - selling) / mrp * 100.0))
}

/// Rounds half away from zero to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Builds an image list with `primary` first and every later duplicate
/// dropped. Empty strings are skipped.
#[must_use]
pub fn collect_images<I>(primary: Option<String>, rest: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut images: Vec<String> = Vec::new();
    for url in primary.into_iter().chain(rest) {
        let url = url.trim();
        if url.is_empty() || images.iter().any(|seen| seen == url) {
            continue;
        }
        images.push(url.to_owned());
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> ProductRecord {
        let mut record = ProductRecord::new("B000TEST01", SiteKind::Amazon);
        record.name = Some("Widget".to_string());
        record.selling_price = Some(80.0);
        record.mrp = Some(100.0);
        record
    }

    #[test]
    fn finalize_derives_discount_from_both_prices() {
        let record = make_record().finalize();
        assert_eq!(record.discount_percent, Some(20.0));
    }

    #[test]
    fn finalize_leaves_discount_absent_without_mrp() {
        let mut record = make_record();
        record.mrp = None;
        assert!(record.finalize().discount_percent.is_none());
    }

    #[test]
    fn finalize_leaves_discount_absent_without_selling_price() {
        let mut record = make_record();
        record.selling_price = None;
        assert!(record.finalize().discount_percent.is_none());
    }

    #[test]
    fn discount_absent_when_mrp_is_zero_or_negative() {
        assert!(discount_percent(Some(0.0), Some(10.0)).is_none());
        assert!(discount_percent(Some(-5.0), Some(10.0)).is_none());
    }

    #[test]
    fn discount_rounds_to_two_places() {
        // (999 - 669) / 999 * 100 = 33.0330...
        assert_eq!(discount_percent(Some(999.0), Some(669.0)), Some(33.03));
        // (3 - 2) / 3 * 100 = 33.333...
        assert_eq!(discount_percent(Some(3.0), Some(2.0)), Some(33.33));
    }

    #[test]
    fn discount_keeps_sign_when_selling_exceeds_mrp() {
        assert_eq!(discount_percent(Some(100.0), Some(125.0)), Some(-25.0));
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert!((round2(0.125) - 0.13).abs() < f64::EPSILON);
        assert!((round2(-0.125) + 0.13).abs() < f64::EPSILON);
    }

    #[test]
    fn collect_images_puts_primary_first_and_dedupes() {
        let images = collect_images(
            Some("https://img/a.jpg".to_string()),
            vec![
                "https://img/b.jpg".to_string(),
                "https://img/a.jpg".to_string(),
                "https://img/b.jpg".to_string(),
                String::new(),
            ],
        );
        assert_eq!(images, vec!["https://img/a.jpg", "https://img/b.jpg"]);
    }

    #[test]
    fn collect_images_without_primary_keeps_order() {
        let images = collect_images(None, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(images, vec!["x", "y"]);
    }

    #[test]
    fn available_sizes_filters_unavailable() {
        let mut record = make_record();
        record.sizes = vec![
            SizeOption {
                label: "S".to_string(),
                available: true,
                sku_id: Some("1".to_string()),
            },
            SizeOption {
                label: "M".to_string(),
                available: false,
                sku_id: None,
            },
        ];
        assert_eq!(record.available_sizes(), vec!["S"]);
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let record = ProductRecord::new("42", SiteKind::Myntra);
        let json = serde_json::to_value(&record).expect("serialization failed");
        let obj = json.as_object().expect("expected object");
        assert_eq!(obj.len(), 2, "unexpected keys: {obj:?}");
        assert_eq!(obj["product_id"], "42");
        assert_eq!(obj["source_site"], "myntra");
    }

    #[test]
    fn serialization_keeps_nested_sequences_and_mappings() {
        let mut record = make_record().finalize();
        record.images = vec!["https://img/a.jpg".to_string()];
        record
            .specifications
            .insert("Weight".to_string(), "1 kg".to_string());
        record.is_fallback = true;

        let json = serde_json::to_value(&record).expect("serialization failed");
        assert_eq!(json["images"][0], "https://img/a.jpg");
        assert_eq!(json["specifications"]["Weight"], "1 kg");
        assert_eq!(json["discount_percent"], 20.0);
        assert_eq!(json["is_fallback"], true);

        let decoded: ProductRecord = serde_json::from_value(json).expect("deserialize failed");
        assert_eq!(decoded, record);
    }
}
