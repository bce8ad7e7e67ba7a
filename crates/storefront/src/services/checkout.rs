//! Checkout: order placement and hand-off to the hosted payment widget.
//!
//! Cash-on-delivery orders are complete once the backend accepts the
//! checkout session. Online orders additionally need the gateway's hosted
//! script; the storefront confirms it can be fetched before rendering the
//! hand-off page, and the widget's callback comes back through
//! [`verify_payment`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use o2_shop_core::{PaymentMode, Product};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::wire::{CheckoutSessionRequest, PaymentVerification, SessionDescriptor};
use crate::api::{ApiError, BackendCredentials, ShopClient};
use crate::config::PaymentConfig;

/// Where the shopper goes after a completed order.
pub const ORDERS_PATH: &str = "/orders";

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please fill in all address fields")]
    MissingAddress,

    #[error("Quantity must be at least 1")]
    QuantityTooLow,

    #[error("Quantity exceeds available stock")]
    ExceedsStock { available: i32 },

    #[error("This product is currently unavailable")]
    ProductUnavailable,

    /// The hosted payment script could not be loaded. The order was created
    /// but no payment was attempted.
    #[error("Failed to load the payment gateway. Check your connection.")]
    ScriptUnavailable(#[source] WidgetError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Text for the inline alert.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message("Error placing order"),
            other => other.to_string(),
        }
    }
}

/// Checkout form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    /// Blank or non-numeric input reads as 0 and fails validation.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub house: String,
    pub mode: PaymentMode,
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse().unwrap_or(0))
}

impl CheckoutForm {
    /// `"{house}, {city}, {state} - {pin}"`.
    #[must_use]
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} - {}",
            self.house.trim(),
            self.city.trim(),
            self.state.trim(),
            self.pin.trim()
        )
    }

    /// Check the form against `product` and build the session request.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: address, quantity, then stock.
    pub fn to_request(&self, product: &Product) -> Result<CheckoutSessionRequest, CheckoutError> {
        let fields = [&self.state, &self.city, &self.pin, &self.house];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(CheckoutError::MissingAddress);
        }
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or(CheckoutError::QuantityTooLow)?;
        if i64::from(quantity) > i64::from(product.stock) {
            return Err(CheckoutError::ExceedsStock {
                available: product.stock,
            });
        }
        if !product.purchasable() {
            return Err(CheckoutError::ProductUnavailable);
        }

        Ok(CheckoutSessionRequest {
            product_id: product.id,
            quantity,
            address: self.full_address(),
            mode: self.mode,
        })
    }
}

// =============================================================================
// Payment widget port
// =============================================================================

/// Errors loading the hosted payment script.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("payment script unreachable: {0}")]
    Unreachable(String),

    #[error("payment script returned HTTP {0}")]
    Status(u16),
}

/// The gateway's hosted checkout script.
#[async_trait]
pub trait PaymentWidget: Send + Sync {
    /// Make sure the script can be served to the browser. Succeeds at once
    /// if an earlier load did.
    async fn load(&self) -> Result<(), WidgetError>;

    /// URL the hand-off page loads the script from.
    fn script_url(&self) -> &str;
}

/// Probes the hosted script URL over HTTP and remembers success.
pub struct HostedCheckoutScript {
    client: reqwest::Client,
    url: String,
    loaded: AtomicBool,
}

impl HostedCheckoutScript {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            url: config.script_url.to_string(),
            loaded: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl PaymentWidget for HostedCheckoutScript {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn load(&self) -> Result<(), WidgetError> {
        if self.loaded.load(Ordering::Acquire) {
            return Ok(());
        }

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WidgetError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WidgetError::Status(status.as_u16()));
        }

        self.loaded.store(true, Ordering::Release);
        info!("Payment script reachable");
        Ok(())
    }

    fn script_url(&self) -> &str {
        &self.url
    }
}

// =============================================================================
// Placing orders
// =============================================================================

/// Everything the hand-off page needs to open the hosted widget.
#[derive(Debug, Clone)]
pub struct PaymentHandoff {
    pub descriptor: SessionDescriptor,
    pub script_url: String,
    pub merchant_name: String,
    /// Shown in the widget; the product name.
    pub description: String,
}

/// Result of a successful order submission.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Cash on delivery: the order is placed.
    Placed,
    /// Online: the shopper must complete payment in the hosted widget.
    AwaitingPayment(PaymentHandoff),
}

impl CheckoutOutcome {
    /// Page to navigate to, if the flow is finished.
    #[must_use]
    pub const fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Placed => Some(ORDERS_PATH),
            Self::AwaitingPayment(_) => None,
        }
    }
}

/// Order placement for one request.
pub struct Checkout<'a> {
    client: &'a ShopClient,
    widget: &'a dyn PaymentWidget,
    merchant_name: &'a str,
}

impl<'a> Checkout<'a> {
    #[must_use]
    pub fn new(
        client: &'a ShopClient,
        widget: &'a dyn PaymentWidget,
        merchant_name: &'a str,
    ) -> Self {
        Self {
            client,
            widget,
            merchant_name,
        }
    }

    /// Validate the form, create the checkout session and, for online
    /// payment, prepare the widget hand-off.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request, the backend's
    /// rejection, or [`CheckoutError::ScriptUnavailable`].
    #[instrument(skip(self, credentials, product, form), fields(product_id = %product.id, mode = %form.mode))]
    pub async fn place_order(
        &self,
        credentials: &BackendCredentials,
        product: &Product,
        form: &CheckoutForm,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let request = form.to_request(product)?;
        let descriptor = self
            .client
            .create_checkout_session(credentials, request)
            .await?;

        match form.mode {
            PaymentMode::Cod => {
                info!("Cash on delivery order placed");
                Ok(CheckoutOutcome::Placed)
            }
            PaymentMode::Online => {
                self.widget.load().await.map_err(|e| {
                    warn!(error = %e, "Payment script unavailable");
                    CheckoutError::ScriptUnavailable(e)
                })?;
                Ok(CheckoutOutcome::AwaitingPayment(PaymentHandoff {
                    descriptor,
                    script_url: self.widget.script_url().to_string(),
                    merchant_name: self.merchant_name.to_string(),
                    description: product.name.clone(),
                }))
            }
        }
    }
}

/// Relay the widget's payment confirmation to the backend.
///
/// # Errors
///
/// Returns the backend's rejection; its text is shown to the shopper.
#[instrument(skip(client, credentials, verification))]
pub async fn verify_payment(
    client: &ShopClient,
    credentials: &BackendCredentials,
    verification: PaymentVerification,
) -> Result<(), ApiError> {
    client.verify_payment(credentials, verification).await?;
    info!("Payment verified");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::ShopApi;
    use crate::testing::{FakePaymentWidget, FakeShopApi};

    const PRODUCT: &str = r#"{"pid":7,"pname":"Kettle","price":1299,"stock":4,"status":1}"#;
    const SESSION: &str = r#"{"id":"order_X","key":"rzp_test","amount":129900,"currency":"INR","buyId":55}"#;

    fn product() -> Product {
        serde_json::from_str(PRODUCT).unwrap()
    }

    fn form(mode: PaymentMode) -> CheckoutForm {
        CheckoutForm {
            quantity: 1,
            state: "MH".to_string(),
            city: "Pune".to_string(),
            pin: "411001".to_string(),
            house: "12 MG Road".to_string(),
            mode,
        }
    }

    fn setup() -> (Arc<FakeShopApi>, ShopClient) {
        let fake = Arc::new(FakeShopApi::new());
        fake.respond("POST /auth/checkout/session", SESSION);
        let client = ShopClient::new(Arc::clone(&fake) as Arc<dyn ShopApi>, Duration::from_secs(1));
        (fake, client)
    }

    #[test]
    fn test_full_address_format() {
        assert_eq!(
            form(PaymentMode::Cod).full_address(),
            "12 MG Road, Pune, MH - 411001"
        );
    }

    #[test]
    fn test_validation_order() {
        let product = product();

        let mut missing = form(PaymentMode::Cod);
        missing.pin = "  ".to_string();
        missing.quantity = 0;
        assert!(matches!(
            missing.to_request(&product),
            Err(CheckoutError::MissingAddress)
        ));

        let mut zero = form(PaymentMode::Cod);
        zero.quantity = 0;
        assert!(matches!(
            zero.to_request(&product),
            Err(CheckoutError::QuantityTooLow)
        ));

        let mut too_many = form(PaymentMode::Cod);
        too_many.quantity = 5;
        assert!(matches!(
            too_many.to_request(&product),
            Err(CheckoutError::ExceedsStock { available: 4 })
        ));
    }

    #[test]
    fn test_blank_quantity_reaches_validation() {
        let product = product();
        for quantity in [Some(""), Some("two"), None] {
            let mut fields = serde_json::json!({
                "house": "12 MG Road", "city": "Pune", "state": "MH", "pin": "411001", "mode": "COD"
            });
            if let Some(q) = quantity {
                fields["quantity"] = serde_json::json!(q);
            }
            let form: CheckoutForm = serde_json::from_value(fields).unwrap();
            assert_eq!(form.quantity, 0);
            assert!(matches!(
                form.to_request(&product),
                Err(CheckoutError::QuantityTooLow)
            ));
        }
    }

    #[tokio::test]
    async fn test_cod_skips_script_and_redirects_to_orders() {
        let (fake, client) = setup();
        let widget = FakePaymentWidget::available();
        let checkout = Checkout::new(&client, &widget, "O2 Shop");

        let outcome = checkout
            .place_order(&BackendCredentials::anonymous(), &product(), &form(PaymentMode::Cod))
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Placed));
        assert_eq!(outcome.redirect(), Some("/orders"));
        assert_eq!(widget.loads(), 0);

        let calls = fake.calls_to("POST /auth/checkout/session");
        assert_eq!(calls.len(), 1);
        let body = calls[0].body().unwrap().unwrap();
        assert_eq!(body["mode"], "COD");
        assert_eq!(body["address"], "12 MG Road, Pune, MH - 411001");
    }

    #[tokio::test]
    async fn test_online_script_failure_does_not_navigate() {
        let (_, client) = setup();
        let widget = FakePaymentWidget::unavailable();
        let checkout = Checkout::new(&client, &widget, "O2 Shop");

        let err = checkout
            .place_order(
                &BackendCredentials::anonymous(),
                &product(),
                &form(PaymentMode::Online),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ScriptUnavailable(_)));
        assert_eq!(widget.loads(), 1);
        assert!(err.user_message().contains("payment gateway"));
    }

    #[tokio::test]
    async fn test_online_success_hands_off_descriptor() {
        let (_, client) = setup();
        let widget = FakePaymentWidget::available();
        let checkout = Checkout::new(&client, &widget, "O2 Shop");

        let outcome = checkout
            .place_order(
                &BackendCredentials::anonymous(),
                &product(),
                &form(PaymentMode::Online),
            )
            .await
            .unwrap();

        assert_eq!(outcome.redirect(), None);
        let CheckoutOutcome::AwaitingPayment(handoff) = outcome else {
            panic!("expected hand-off");
        };
        assert_eq!(handoff.descriptor.id.as_deref(), Some("order_X"));
        assert_eq!(handoff.descriptor.buy_id_text(), "55");
        assert_eq!(handoff.description, "Kettle");
        assert_eq!(handoff.merchant_name, "O2 Shop");
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let (fake, client) = setup();
        let widget = FakePaymentWidget::available();
        let checkout = Checkout::new(&client, &widget, "O2 Shop");
        let mut bad = form(PaymentMode::Online);
        bad.city.clear();

        let err = checkout
            .place_order(&BackendCredentials::anonymous(), &product(), &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingAddress));
        assert!(fake.calls().is_empty());
        assert_eq!(widget.loads(), 0);
    }

    #[tokio::test]
    async fn test_backend_rejection_text_is_shown() {
        let (fake, client) = setup();
        fake.fail("POST /auth/checkout/session", 400, "Insufficient stock");
        let widget = FakePaymentWidget::available();
        let checkout = Checkout::new(&client, &widget, "O2 Shop");

        let err = checkout
            .place_order(&BackendCredentials::anonymous(), &product(), &form(PaymentMode::Cod))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Insufficient stock");
    }

    #[tokio::test]
    async fn test_verify_payment_posts_widget_fields() {
        let (fake, client) = setup();
        fake.respond("POST /auth/payment/verify", "ok");

        verify_payment(
            &client,
            &BackendCredentials::anonymous(),
            PaymentVerification {
                buy_id: "55".to_string(),
                razorpay_payment_id: "pay_1".to_string(),
                razorpay_order_id: "order_X".to_string(),
                razorpay_signature: "sig".to_string(),
            },
        )
        .await
        .unwrap();

        let calls = fake.calls_to("POST /auth/payment/verify");
        let body = calls[0].body().unwrap().unwrap();
        assert_eq!(body["buyId"], 55);
        assert_eq!(body["razorpay_signature"], "sig");
    }
}
