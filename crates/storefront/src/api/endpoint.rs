//! Backend endpoints as data.

use o2_shop_core::{
    DeliveryStatus, Email, NewProduct, OrderId, ProductId, ProductUpdate,
};
use reqwest::Method;
use serde_json::{Value, json};

use super::wire::{
    CheckoutSessionRequest, LoginRequest, PaymentVerification, ProfileUpdate, SignUpRequest,
};

/// Which catalog a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Public catalog (`/auth/products/search`).
    Public,
    /// The logged-in seller's own products (`/seller/products/search`).
    Seller,
}

/// One backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    // Catalog
    Products,
    Product(ProductId),
    SearchProducts { scope: SearchScope, keyword: String },

    // Cart
    Cart,
    AddToCart(ProductId),
    UpdateCartQuantity { product_id: ProductId, quantity: u32 },
    RemoveFromCart(ProductId),

    // Orders and checkout
    Orders,
    CheckoutProduct(ProductId),
    CheckoutSession(CheckoutSessionRequest),
    VerifyPayment(PaymentVerification),

    // Seller catalog
    SellerProducts,
    AddProduct(NewProduct),
    UpdateProduct { id: ProductId, update: ProductUpdate },
    AddProductPhoto { id: ProductId, photo: String },

    // Seller orders
    SellerOrders,
    UpdateOrderStatus { id: OrderId, status: DeliveryStatus },
    DeleteOrder(OrderId),

    // Identity
    Login(LoginRequest),
    SignUp(SignUpRequest),
    Logout,
    Profile,
    UpdateProfile(ProfileUpdate),

    // Newsletter
    Subscribe(Email),
}

impl Endpoint {
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::Products
            | Self::Product(_)
            | Self::SearchProducts { .. }
            | Self::Cart
            | Self::Orders
            | Self::CheckoutProduct(_)
            | Self::SellerProducts
            | Self::SellerOrders
            | Self::Profile => Method::GET,
            Self::AddToCart(_)
            | Self::CheckoutSession(_)
            | Self::VerifyPayment(_)
            | Self::AddProduct(_)
            | Self::AddProductPhoto { .. }
            | Self::Login(_)
            | Self::SignUp(_)
            | Self::Logout
            | Self::Subscribe(_) => Method::POST,
            Self::UpdateCartQuantity { .. }
            | Self::UpdateProduct { .. }
            | Self::UpdateOrderStatus { .. }
            | Self::UpdateProfile(_) => Method::PUT,
            Self::RemoveFromCart(_) | Self::DeleteOrder(_) => Method::DELETE,
        }
    }

    /// Path relative to the backend base URL, with a leading slash.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Products => "/auth/products".to_string(),
            Self::Product(id) => format!("/auth/products/{id}"),
            Self::SearchProducts {
                scope: SearchScope::Public,
                ..
            } => "/auth/products/search".to_string(),
            Self::SearchProducts {
                scope: SearchScope::Seller,
                ..
            } => "/seller/products/search".to_string(),
            Self::Cart => "/user/cart".to_string(),
            Self::AddToCart(id) => format!("/user/Addtocart/{id}"),
            Self::UpdateCartQuantity { product_id, .. } => {
                format!("/user/cart/update/{product_id}")
            }
            Self::RemoveFromCart(id) => format!("/user/cart/remove/{id}"),
            Self::Orders => "/user/orders".to_string(),
            Self::CheckoutProduct(id) => format!("/user/products/{id}"),
            Self::CheckoutSession(_) => "/auth/checkout/session".to_string(),
            Self::VerifyPayment(_) => "/auth/payment/verify".to_string(),
            Self::SellerProducts => "/seller/products".to_string(),
            Self::AddProduct(_) => "/seller/addProducts".to_string(),
            Self::UpdateProduct { id, .. } => format!("/seller/updateProduct/{id}"),
            Self::AddProductPhoto { id, .. } => format!("/seller/products/{id}/addPhoto"),
            Self::SellerOrders => "/seller/myOrders".to_string(),
            Self::UpdateOrderStatus { id, .. } => format!("/seller/orders/{id}/status"),
            Self::DeleteOrder(id) => format!("/seller/orders/{id}"),
            Self::Login(_) => "/auth/login".to_string(),
            Self::SignUp(_) => "/auth/signUp".to_string(),
            Self::Logout => "/auth/logout".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::UpdateProfile(_) => "/update".to_string(),
            Self::Subscribe(_) => "/auth/mail/newSus".to_string(),
        }
    }

    /// Query-string parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::SearchProducts { keyword, .. } => vec![("keyword", keyword.clone())],
            Self::Subscribe(email) => vec![("email", email.as_str().to_string())],
            _ => Vec::new(),
        }
    }

    /// JSON request body.
    ///
    /// # Errors
    ///
    /// Returns an error if a body fails to serialize.
    pub fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        let body = match self {
            Self::UpdateCartQuantity { quantity, .. } => json!({ "quantity": quantity }),
            Self::CheckoutSession(req) => serde_json::to_value(req)?,
            Self::VerifyPayment(v) => serde_json::to_value(v)?,
            Self::AddProduct(p) => serde_json::to_value(p)?,
            Self::UpdateProduct { update, .. } => serde_json::to_value(update)?,
            Self::AddProductPhoto { photo, .. } => json!({ "photo": photo }),
            Self::UpdateOrderStatus { status, .. } => json!({ "status": status.as_str() }),
            Self::Login(req) => serde_json::to_value(req)?,
            Self::SignUp(req) => serde_json::to_value(req)?,
            Self::UpdateProfile(update) => serde_json::to_value(update)?,
            _ => return Ok(None),
        };
        Ok(Some(body))
    }

    /// `"METHOD /path"`, for logs and test fakes.
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} {}", self.method(), self.path())
    }

    /// Whether a success invalidates cached catalog data.
    #[must_use]
    pub const fn changes_catalog(&self) -> bool {
        matches!(
            self,
            Self::AddProduct(_) | Self::UpdateProduct { .. } | Self::AddProductPhoto { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use o2_shop_core::PaymentMode;

    use super::*;

    #[test]
    fn test_order_status_endpoint() {
        let endpoint = Endpoint::UpdateOrderStatus {
            id: OrderId::new(42),
            status: DeliveryStatus::Delivered,
        };
        assert_eq!(endpoint.method(), Method::PUT);
        assert_eq!(endpoint.path(), "/seller/orders/42/status");
        assert_eq!(
            endpoint.body().unwrap(),
            Some(json!({ "status": "Delivered" }))
        );
        assert_eq!(endpoint.route(), "PUT /seller/orders/42/status");
    }

    #[test]
    fn test_cart_endpoints() {
        let update = Endpoint::UpdateCartQuantity {
            product_id: ProductId::new(3),
            quantity: 4,
        };
        assert_eq!(update.route(), "PUT /user/cart/update/3");
        assert_eq!(update.body().unwrap(), Some(json!({ "quantity": 4 })));

        let remove = Endpoint::RemoveFromCart(ProductId::new(3));
        assert_eq!(remove.route(), "DELETE /user/cart/remove/3");
        assert_eq!(remove.body().unwrap(), None);

        assert_eq!(
            Endpoint::AddToCart(ProductId::new(3)).route(),
            "POST /user/Addtocart/3"
        );
    }

    #[test]
    fn test_search_scope_selects_path() {
        let public = Endpoint::SearchProducts {
            scope: SearchScope::Public,
            keyword: "lamp".to_string(),
        };
        let seller = Endpoint::SearchProducts {
            scope: SearchScope::Seller,
            keyword: "lamp".to_string(),
        };
        assert_eq!(public.path(), "/auth/products/search");
        assert_eq!(seller.path(), "/seller/products/search");
        assert_eq!(public.query(), vec![("keyword", "lamp".to_string())]);
    }

    #[test]
    fn test_newsletter_sends_email_as_query() {
        let email = Email::parse("Fan@Example.com").unwrap();
        let endpoint = Endpoint::Subscribe(email);
        assert_eq!(endpoint.route(), "POST /auth/mail/newSus");
        assert_eq!(
            endpoint.query(),
            vec![("email", "fan@example.com".to_string())]
        );
        assert_eq!(endpoint.body().unwrap(), None);
    }

    #[test]
    fn test_checkout_session_body() {
        let endpoint = Endpoint::CheckoutSession(CheckoutSessionRequest {
            product_id: ProductId::new(9),
            quantity: 1,
            address: "a, b, c - 1".to_string(),
            mode: PaymentMode::Cod,
        });
        let body = endpoint.body().unwrap().unwrap();
        assert_eq!(body["productId"], 9);
        assert_eq!(body["mode"], "COD");
    }

    #[test]
    fn test_catalog_mutations() {
        assert!(!Endpoint::Products.changes_catalog());
        assert!(!Endpoint::Cart.changes_catalog());
        assert!(
            Endpoint::AddProductPhoto {
                id: ProductId::new(1),
                photo: String::new()
            }
            .changes_catalog()
        );
        assert!(!Endpoint::DeleteOrder(OrderId::new(1)).changes_catalog());
    }
}
