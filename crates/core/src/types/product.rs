//! Catalog products.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Price, ProductId, ProductStatus};

/// A product as returned by the catalog endpoints.
///
/// Images are base64-encoded JPEG/PNG payloads. Listing endpoints send a
/// single string in `img`; the detail endpoint sends an array. Both end up
/// in `images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "pid")]
    pub id: ProductId,
    #[serde(rename = "pname", default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(rename = "img", default, deserialize_with = "deserialize_images")]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "sellername", default)]
    pub seller_name: Option<String>,
}

impl Product {
    /// First image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether a shopper may add this product to the cart or buy it.
    #[must_use]
    pub const fn purchasable(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImagesRepr {
    One(String),
    Many(Vec<Option<String>>),
}

/// Accept `null`, a single base64 string, or an array of them.
///
/// Blank entries are dropped so templates never render an empty data URI.
fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<ImagesRepr>::deserialize(deserializer)?;
    let images = match repr {
        None => Vec::new(),
        Some(ImagesRepr::One(s)) => vec![s],
        Some(ImagesRepr::Many(list)) => list.into_iter().flatten().collect(),
    };
    Ok(images
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Body of `POST /seller/addProducts`.
///
/// New products are created without images; photos are attached afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    pub pid: i32,
    pub pname: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category: String,
    pub status: ProductStatus,
    pub img: Option<String>,
}

/// Body of `PUT /seller/updateProduct/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductUpdate {
    pub pname: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub status: ProductStatus,
}

impl From<&Product> for ProductUpdate {
    fn from(product: &Product) -> Self {
        Self {
            pname: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            status: product.status,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_product_with_single_image() {
        let json = r#"{"pid":3,"pname":"Mouse","description":"Wireless","price":499,
            "stock":5,"status":1,"img":"QUJD","category":"Electronics"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.images, vec!["QUJD".to_string()]);
        assert_eq!(product.primary_image(), Some("QUJD"));
        assert!(product.purchasable());
        assert!(product.in_stock());
    }

    #[test]
    fn test_detail_product_with_image_array() {
        let json = r#"{"pid":3,"pname":"Mouse","price":499.5,"stock":0,"status":0,
            "img":["QUJD",null," ","REVG"],"sellername":"Acme"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.images, vec!["QUJD".to_string(), "REVG".to_string()]);
        assert_eq!(product.seller_name.as_deref(), Some("Acme"));
        assert!(!product.purchasable());
        assert!(!product.in_stock());
    }

    #[test]
    fn test_product_without_image() {
        let json = r#"{"pid":1,"pname":"Book","price":10,"stock":1,"status":1,"img":null}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.images.is_empty());
        assert_eq!(product.primary_image(), None);
    }

    #[test]
    fn test_new_product_body() {
        let body = NewProduct {
            pid: 0,
            pname: "Lamp".to_string(),
            description: String::new(),
            price: Price::ZERO,
            stock: 2,
            category: "Home Appliances".to_string(),
            status: ProductStatus::Active,
            img: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["status"], 1);
        assert_eq!(value["img"], serde_json::Value::Null);
        assert_eq!(value["category"], "Home Appliances");
    }
}
