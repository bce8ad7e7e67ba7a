//! Status and classification enums.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account classification gating which views and actions are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A shopper: cart, checkout and order history.
    #[default]
    User,
    /// A merchant: catalog and order management.
    Seller,
}

impl Role {
    /// Wire value (`USER` / `SELLER`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Seller => "SELLER",
        }
    }

    /// Landing page after login.
    #[must_use]
    pub const fn home_path(&self) -> &'static str {
        match self {
            Self::User => "/dashboard",
            Self::Seller => "/seller/dashboard",
        }
    }

    #[must_use]
    pub const fn is_seller(&self) -> bool {
        matches!(self, Self::Seller)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "SELLER" => Ok(Self::Seller),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Listing status of a product.
///
/// The backend encodes this as an integer: `1` is active, anything else is
/// inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "i32", into = "i32")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Label shown to shoppers on the product page.
    #[must_use]
    pub const fn availability_label(&self) -> &'static str {
        match self {
            Self::Active => "Available",
            Self::Inactive => "Out of Stock",
        }
    }
}

impl From<i32> for ProductStatus {
    fn from(value: i32) -> Self {
        if value == 1 {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl From<ProductStatus> for i32 {
    fn from(status: ProductStatus) -> Self {
        match status {
            ProductStatus::Active => 1,
            ProductStatus::Inactive => 0,
        }
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    /// Cash on delivery; no payment gateway involved.
    #[default]
    Cod,
    /// Paid through the hosted checkout widget.
    Online,
}

impl PaymentMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::Online => "ONLINE",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Online => "Online Payment",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of an order.
///
/// The backend stores free text. The seller console offers a fixed set of
/// values; anything else the backend returns is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Paid,
    Confirmed,
    Shipped,
    Delivered,
    Rejected,
    Other(String),
}

impl DeliveryStatus {
    /// Statuses a seller can move an order to, after the initial one.
    pub const SELLER_TRANSITIONS: [Self; 4] =
        [Self::Confirmed, Self::Shipped, Self::Delivered, Self::Rejected];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Rejected => "Rejected",
            Self::Other(s) => s,
        }
    }

    /// Free text outside the known set.
    #[must_use]
    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }

    /// Options offered in the seller's status dropdown for an order whose
    /// current status is `self`.
    ///
    /// The first entry is `Paid` for paid orders and `Pending` otherwise.
    #[must_use]
    pub fn seller_options(&self) -> Vec<Self> {
        let initial = if *self == Self::Paid {
            Self::Paid
        } else {
            Self::Pending
        };
        std::iter::once(initial)
            .chain(Self::SELLER_TRANSITIONS.iter().cloned())
            .collect()
    }
}

impl From<String> for DeliveryStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => Self::Pending,
            "Paid" => Self::Paid,
            "Confirmed" => Self::Confirmed,
            "Shipped" => Self::Shipped,
            "Delivered" => Self::Delivered,
            "Rejected" => Self::Rejected,
            _ => Self::Other(value),
        }
    }
}

impl From<DeliveryStatus> for String {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product categories offered on the seller's add-product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Fashion,
    #[serde(rename = "Home Appliances")]
    HomeAppliances,
    Books,
    Beauty,
    Sports,
    Toys,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::Electronics,
        Self::Fashion,
        Self::HomeAppliances,
        Self::Books,
        Self::Beauty,
        Self::Sports,
        Self::Toys,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Fashion => "Fashion",
            Self::HomeAppliances => "Home Appliances",
            Self::Books => "Books",
            Self::Beauty => "Beauty",
            Self::Sports => "Sports",
            Self::Toys => "Toys",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"SELLER\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(Role::Seller.home_path(), "/seller/dashboard");
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_product_status_from_integer() {
        let status: ProductStatus = serde_json::from_str("1").unwrap();
        assert!(status.is_active());
        let status: ProductStatus = serde_json::from_str("0").unwrap();
        assert_eq!(status, ProductStatus::Inactive);
        let status: ProductStatus = serde_json::from_str("5").unwrap();
        assert_eq!(status, ProductStatus::Inactive);
        assert_eq!(serde_json::to_string(&ProductStatus::Active).unwrap(), "1");
    }

    #[test]
    fn test_payment_mode_wire_format() {
        assert_eq!(serde_json::to_string(&PaymentMode::Cod).unwrap(), "\"COD\"");
        let mode: PaymentMode = serde_json::from_str("\"ONLINE\"").unwrap();
        assert_eq!(mode, PaymentMode::Online);
    }

    #[test]
    fn test_delivery_status_keeps_unknown_text() {
        let status: DeliveryStatus = serde_json::from_str("\"Out for delivery\"").unwrap();
        assert_eq!(status, DeliveryStatus::Other("Out for delivery".to_string()));
        assert!(status.is_other());
        assert!(!DeliveryStatus::Paid.is_other());
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"Out for delivery\""
        );
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::Delivered).unwrap(),
            "\"Delivered\""
        );
    }

    #[test]
    fn test_seller_options_start_with_paid_or_pending() {
        let paid = DeliveryStatus::Paid.seller_options();
        assert_eq!(paid.first(), Some(&DeliveryStatus::Paid));
        assert_eq!(paid.len(), 5);

        let shipped = DeliveryStatus::Shipped.seller_options();
        assert_eq!(shipped.first(), Some(&DeliveryStatus::Pending));
        assert!(shipped.contains(&DeliveryStatus::Delivered));
        assert!(!shipped.contains(&DeliveryStatus::Paid));
    }

    #[test]
    fn test_category_round_trips_display_names() {
        assert_eq!(
            "Home Appliances".parse::<Category>().unwrap(),
            Category::HomeAppliances
        );
        assert_eq!(
            serde_json::to_string(&Category::HomeAppliances).unwrap(),
            "\"Home Appliances\""
        );
    }
}
