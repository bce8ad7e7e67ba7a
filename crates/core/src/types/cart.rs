//! Cart lines.

use serde::{Deserialize, Serialize};

use super::{CartItemId, Price, Product};

/// A product in the shopper's cart with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_line_total() {
        let json = r#"{"id":9,"quantity":3,
            "product":{"pid":2,"pname":"Pen","price":12.5,"stock":10,"status":1,"img":""}}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.line_total().to_plain_string(), "37.50");
    }

    #[test]
    fn test_cart_item_missing_quantity_defaults_to_one() {
        let json = r#"{"id":9,"product":{"pid":2,"pname":"Pen","price":1,"stock":1,"status":1}}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.quantity, 1);
    }
}
