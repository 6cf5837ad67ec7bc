use serde_json::json;

use super::*;

const URL: &str = "https://www.myntra.com/gateway/v2/product/1234567";

fn payload(value: Value) -> RawPayload {
    RawPayload::Json {
        value,
        final_url: URL.to_string(),
    }
}

fn full_style() -> Value {
    json!({
        "style": {
            "id": 1_234_567,
            "name": "Men Slim Fit Casual Shirt",
            "brand": {"name": "Roadster"},
            "mrp": 1999,
            "discounts": [{"discountPercent": 60}],
            "baseColour": "Navy Blue",
            "countryOfOrigin": "India",
            "manufacturer": "Acme Apparel",
            "analytics": {
                "masterCategory": "Apparel",
                "subCategory": "Topwear",
                "articleType": "Shirts",
                "gender": "Men"
            },
            "productDetails": [
                {"title": "Product Details", "description": "Navy solid casual shirt"},
                {"title": "MATERIAL & CARE", "description": "100% cotton"},
                {"title": "SIZE & FIT", "description": "Slim fit"},
                {"title": "Ignored", "description": "nope"}
            ],
            "sizes": [
                {"label": "S", "available": false, "skuId": 111},
                {"label": "M", "available": true, "skuId": 112},
                {"label": "L", "available": true}
            ],
            "ratings": {"averageRating": 4.2, "totalCount": 3120},
            "media": {"albums": [
                {"name": "default", "images": [
                    {"secureSrc": "https://assets.myntassets.com/h_($height),q_($qualityPercentage),w_($width)/a.jpg"},
                    {"secureSrc": "https://assets.myntassets.com/h_($height),q_($qualityPercentage),w_($width)/b.jpg"},
                    {"secureSrc": "https://assets.myntassets.com/h_($height),q_($qualityPercentage),w_($width)/a.jpg"},
                    {"src": "no secure src"}
                ]},
                {"name": "animatedImage", "images": [
                    {"secureSrc": "https://assets.myntassets.com/anim.gif"}
                ]}
            ]}
        }
    })
}

#[test]
fn discount_fixture_yields_discounted_price() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "style": {"id": 42, "mrp": 1000, "discounts": [{"discountPercent": 25}]}
        })))
        .expect("record");
    assert_eq!(record.product_id, "42");
    assert_eq!(record.selling_price, Some(750.0));
    assert_eq!(record.mrp, Some(1000.0));
    assert_eq!(record.discount_percent, Some(25.0));
    assert!(!record.is_fallback);
}

#[test]
fn discounted_price_truncates_fractions() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "style": {"id": 7, "mrp": 999, "discounts": [{"discountPercent": 15}]}
        })))
        .unwrap();
    // 999 * 0.85 = 849.15
    assert_eq!(record.selling_price, Some(849.0));
}

#[test]
fn full_style_extracts_every_field() {
    let record = MyntraSite::new().extract(payload(full_style())).expect("record");

    assert_eq!(record.product_id, "1234567");
    assert_eq!(record.source_site, SiteKind::Myntra);
    assert_eq!(record.url.as_deref(), Some(URL));
    assert_eq!(record.name.as_deref(), Some("Men Slim Fit Casual Shirt"));
    assert_eq!(record.brand.as_deref(), Some("Roadster"));
    assert_eq!(record.selling_price, Some(799.0));
    assert_eq!(record.discount_percent, Some(60.03));
    assert_eq!(record.categories, vec!["Apparel", "Topwear", "Shirts"]);
    assert_eq!(record.description.as_deref(), Some("Navy solid casual shirt"));
    assert_eq!(record.average_rating, Some(4.2));
    assert_eq!(record.rating_count, Some(3120));

    let specs = &record.specifications;
    assert_eq!(specs["Colour"], "Navy Blue");
    assert_eq!(specs["Gender"], "Men");
    assert_eq!(specs["Country of Origin"], "India");
    assert_eq!(specs["Manufacturer"], "Acme Apparel");
    assert_eq!(specs["Material & Care"], "100% cotton");
    assert_eq!(specs["Size & Fit"], "Slim fit");
    assert_eq!(specs.len(), 6);
}

#[test]
fn sizes_and_stock() {
    let record = MyntraSite::new().extract(payload(full_style())).unwrap();
    assert_eq!(
        record.sizes,
        vec![
            SizeOption {
                label: "S".to_string(),
                available: false,
                sku_id: Some("111".to_string()),
            },
            SizeOption {
                label: "M".to_string(),
                available: true,
                sku_id: Some("112".to_string()),
            },
            SizeOption {
                label: "L".to_string(),
                available: true,
                sku_id: None,
            },
        ]
    );
    assert_eq!(record.in_stock, Some(true));
    assert_eq!(record.available_sizes(), vec!["M", "L"]);
}

#[test]
fn no_available_size_means_out_of_stock() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "style": {"id": 1, "sizes": [{"label": "M", "available": false}]}
        })))
        .unwrap();
    assert_eq!(record.in_stock, Some(false));
}

#[test]
fn default_album_images_with_placeholders_filled() {
    let record = MyntraSite::new().extract(payload(full_style())).unwrap();
    assert_eq!(
        record.images,
        vec![
            "https://assets.myntassets.com/h_1080,q_90,w_720/a.jpg",
            "https://assets.myntassets.com/h_1080,q_90,w_720/b.jpg",
        ]
    );
}

#[test]
fn price_discounted_used_without_discount_list() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "style": {"id": 5, "mrp": 500, "price": {"discounted": 400}}
        })))
        .unwrap();
    assert_eq!(record.selling_price, Some(400.0));
    assert_eq!(record.discount_percent, Some(20.0));
}

#[test]
fn missing_optional_sections_are_omitted() {
    let record = MyntraSite::new()
        .extract(payload(json!({"style": {"id": 9, "brand": "not an object"}})))
        .unwrap();
    assert!(record.brand.is_none());
    assert!(record.selling_price.is_none());
    assert!(record.discount_percent.is_none());
    assert!(record.images.is_empty());
    assert!(record.sizes.is_empty());
    assert!(record.in_stock.is_none());
}

#[test]
fn nested_object_with_id_takes_fallback_path() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "product": {"id": 987_654, "name": "Loose Tee", "price": {"mrp": 800, "discounted": 600}}
        })))
        .expect("fallback record");
    assert!(record.is_fallback);
    assert_eq!(record.product_id, "987654");
    assert_eq!(record.name.as_deref(), Some("Loose Tee"));
    assert_eq!(record.selling_price, Some(600.0));
    assert_eq!(record.discount_percent, Some(25.0));
}

#[test]
fn data_style_envelope_is_fallback() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "data": {"style": {
                "id": 55,
                "name": "Sneakers",
                "brand": {"name": "Kicks"},
                "media": {"albums": [
                    {"name": "front", "images": [{"secureSrc": "https://x/($width).jpg"}]},
                    {"name": "back", "images": [{"secureSrc": "https://x/back.jpg"}]}
                ]}
            }}
        })))
        .expect("fallback record");
    assert!(record.is_fallback);
    assert_eq!(record.product_id, "55");
    assert_eq!(record.brand.as_deref(), Some("Kicks"));
    assert_eq!(record.images, vec!["https://x/720.jpg", "https://x/back.jpg"]);
}

#[test]
fn object_under_data_is_scanned() {
    let record = MyntraSite::new()
        .extract(payload(json!({"data": {"pdp": {"id": "321", "name": "Cap"}}})))
        .expect("fallback record");
    assert!(record.is_fallback);
    assert_eq!(record.product_id, "321");
}

#[test]
fn non_scalar_style_id_takes_fallback_path() {
    let record = MyntraSite::new()
        .extract(payload(json!({
            "style": {"id": {"value": 1}, "name": "Broken"},
            "product": {"id": 4242, "name": "Linen Shirt", "price": {"mrp": 1000, "discounted": 900}}
        })))
        .expect("fallback record");
    assert!(record.is_fallback);
    assert_eq!(record.product_id, "4242");
    assert_eq!(record.name.as_deref(), Some("Linen Shirt"));

    let array_id = MyntraSite::new()
        .extract(payload(json!({"style": {"id": [1, 2]}, "data": {"pdp": {"id": "77"}}})))
        .expect("fallback record");
    assert!(array_id.is_fallback);
    assert_eq!(array_id.product_id, "77");
}

#[test]
fn payload_without_any_id_is_none() {
    let site = MyntraSite::new();
    assert!(site
        .extract(payload(json!({"style": {"name": "no id"}})))
        .is_none());
    assert!(site.extract(payload(json!({"error": "not found"}))).is_none());
    assert!(site.extract(payload(json!([1, 2, 3]))).is_none());
}

#[test]
fn html_payload_is_not_myntra() {
    let html = RawPayload::Html {
        text: "<html></html>".to_string(),
        final_url: URL.to_string(),
    };
    assert!(MyntraSite::new().extract(html).is_none());
}

#[test]
fn extraction_is_idempotent() {
    let site = MyntraSite::new();
    let p = payload(full_style());
    assert_eq!(site.extract(p.clone()), site.extract(p));
}

#[test]
fn style_id_validation_and_url() {
    let site = MyntraSite::new();
    assert_eq!(
        site.resolve_url(" 1234567 ", Region::Us).unwrap().as_str(),
        "https://www.myntra.com/gateway/v2/product/1234567"
    );
    assert!(matches!(
        site.resolve_url("12ab", Region::Us),
        Err(ScraperError::InvalidIdentifier {
            site: SiteKind::Myntra,
            ..
        })
    ));
    assert!(site.resolve_url("", Region::Us).is_err());
}

#[test]
fn api_headers_ask_for_json() {
    let headers = MyntraSite::new().default_headers();
    assert_eq!(headers[ACCEPT], "application/json");
    assert_eq!(headers[ORIGIN], "https://www.myntra.com");
}
