//! Request and response bodies that only exist on the wire.
//!
//! Domain records (products, orders, profiles) live in `o2_shop_core`.

use std::fmt;

use o2_shop_core::{PaymentMode, ProductId, Role};
use serde::{Deserialize, Serialize, Serializer};

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub gmail: String,
    pub pass: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("gmail", &self.gmail)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body of `POST /auth/signUp`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Body of `POST /auth/checkout/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub address: String,
    pub mode: PaymentMode,
}

/// Payment session returned by `POST /auth/checkout/session`.
///
/// Opaque to the storefront except for being handed to the hosted widget.
/// COD orders get a descriptor too, which is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Gateway order id.
    #[serde(default)]
    pub id: Option<String>,
    /// Public gateway key.
    #[serde(default)]
    pub key: Option<String>,
    /// Amount in the currency's minor unit.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Backend purchase id, echoed back on verification.
    #[serde(rename = "buyId", default)]
    pub buy_id: Option<serde_json::Value>,
}

impl SessionDescriptor {
    /// `buyId` as text for the verification form.
    #[must_use]
    pub fn buy_id_text(&self) -> String {
        match &self.buy_id {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Body of `POST /auth/payment/verify`, relayed from the hosted widget.
///
/// `buyId` travels through the hand-off form as text and goes back to the
/// backend with the JSON type it arrived with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    #[serde(rename = "buyId", serialize_with = "serialize_buy_id")]
    pub buy_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

/// Integer ids go out as JSON numbers, anything else as a string.
fn serialize_buy_id<S: Serializer>(buy_id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match buy_id.trim().parse::<i64>() {
        Ok(id) => serializer.serialize_i64(id),
        Err(_) => serializer.serialize_str(buy_id),
    }
}

/// Body of `PUT /update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// Data URI of the new avatar.
    pub photo: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_request_wire_names() {
        let body = CheckoutSessionRequest {
            product_id: ProductId::new(7),
            quantity: 2,
            address: "12 MG Road, Pune, MH - 411001".to_string(),
            mode: PaymentMode::Online,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["productId"], 7);
        assert_eq!(value["mode"], "ONLINE");
        assert_eq!(value["quantity"], 2);
    }

    #[test]
    fn test_session_descriptor_buy_id_number_or_string() {
        let numeric: SessionDescriptor =
            serde_json::from_str(r#"{"id":"order_1","amount":49900,"buyId":17}"#).unwrap();
        assert_eq!(numeric.buy_id_text(), "17");
        assert_eq!(numeric.amount, Some(49900));

        let text: SessionDescriptor = serde_json::from_str(r#"{"buyId":"b-9"}"#).unwrap();
        assert_eq!(text.buy_id_text(), "b-9");

        let empty: SessionDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.buy_id_text(), "");
    }

    #[test]
    fn test_verification_echoes_numeric_buy_id_as_number() {
        let descriptor: SessionDescriptor = serde_json::from_str(r#"{"buyId":17}"#).unwrap();
        let verification = PaymentVerification {
            buy_id: descriptor.buy_id_text(),
            razorpay_payment_id: "pay_1".to_string(),
            razorpay_order_id: "order_1".to_string(),
            razorpay_signature: "sig".to_string(),
        };
        let body = serde_json::to_value(&verification).unwrap();
        assert_eq!(body["buyId"], serde_json::json!(17));

        let text = PaymentVerification {
            buy_id: "b-9".to_string(),
            ..verification
        };
        assert_eq!(serde_json::to_value(&text).unwrap()["buyId"], "b-9");
    }

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req = LoginRequest {
            gmail: "a@b.co".to_string(),
            pass: "hunter22".to_string(),
        };
        assert!(!format!("{req:?}").contains("hunter22"));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["pass"], "hunter22");
    }

    #[test]
    fn test_login_response_without_role() {
        let resp: LoginResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.role, None);
    }
}
