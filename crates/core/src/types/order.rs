//! Orders, as seen by shoppers and sellers.

use serde::{Deserialize, Serialize};

use super::{DeliveryStatus, OrderId, PaymentMode, Price, ProductId};

/// An order with a snapshot of the product it was placed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "pid")]
    pub product_id: ProductId,
    #[serde(rename = "pname", default)]
    pub product_name: String,
    #[serde(rename = "img", default)]
    pub image: Option<String>,
    pub quantity: u32,
    pub price: Price,
    pub mode: PaymentMode,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(rename = "deDate", default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub address: String,
}

impl Order {
    /// Delivery date, or `"Pending"` when none is scheduled.
    #[must_use]
    pub fn delivery_date_label(&self) -> &str {
        self.delivery_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("Pending")
    }

    /// Image payload, ignoring blank strings.
    #[must_use]
    pub fn image_payload(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_backend() {
        let json = r#"{"id":42,"pid":3,"pname":"Mouse","img":"","quantity":2,"price":998,
            "mode":"COD","status":"Confirmed","deDate":null,"address":"1 Main, Pune, MH - 411001"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new(42));
        assert_eq!(order.status, DeliveryStatus::Confirmed);
        assert_eq!(order.delivery_date_label(), "Pending");
        assert_eq!(order.image_payload(), None);
    }

    #[test]
    fn test_order_with_delivery_date() {
        let json = r#"{"id":1,"pid":3,"quantity":1,"price":1,"mode":"ONLINE","status":"Paid",
            "deDate":"2025-11-02"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.delivery_date_label(), "2025-11-02");
        assert_eq!(order.mode, PaymentMode::Online);
    }
}
