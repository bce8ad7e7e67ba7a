//! Cart mirror with optimistic quantity and removal updates.
//!
//! The cart page keeps a copy of the last fetched cart in the session and
//! edits it before the backend confirms. Each mutation is split in two:
//!
//! - `begin_*` applies the change locally and returns a pending token that
//!   remembers what to restore
//! - `settle_*` takes the backend's answer and, on failure, restores the
//!   state captured by the token
//!
//! [`CartState::remove`] and [`CartState::set_quantity`] run both halves
//! around the backend call. There is no queuing or de-duplication: when two
//! mutations race, the last one to settle wins.

use o2_shop_core::{CartItem, Price, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, BackendCredentials, ShopClient};

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity below one. Nothing was sent.
    #[error("Quantity must be at least 1")]
    QuantityRejected,

    /// The product is not in the mirrored cart.
    #[error("Product {0} is not in your cart")]
    NotInCart(ProductId),

    /// Backend call failed; the mirror has been restored.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Pending removal, holding the full pre-removal list.
#[derive(Debug)]
#[must_use = "settle the removal with the backend's answer"]
pub struct PendingRemoval {
    product_id: ProductId,
    snapshot: Vec<CartItem>,
}

impl PendingRemoval {
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// Pending quantity change.
#[derive(Debug)]
#[must_use = "settle the quantity change with the backend's answer"]
pub struct PendingQuantity {
    product_id: ProductId,
    previous: u32,
    requested: u32,
}

impl PendingQuantity {
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub const fn requested(&self) -> u32 {
        self.requested
    }
}

/// The shopper's cart as last seen by this view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    #[must_use]
    pub const fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Fetch the cart from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an anonymous session and
    /// [`ApiError::Parse`] when the payload is not a list.
    pub async fn load(
        client: &ShopClient,
        credentials: &BackendCredentials,
    ) -> Result<Self, ApiError> {
        Ok(Self::new(client.cart(credentials).await?))
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.find(product_id).map(|i| i.quantity)
    }

    fn find(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product.id == product_id)
    }

    fn find_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product.id == product_id)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Drop the line for `product_id` from the visible list.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if no line matches.
    pub fn begin_remove(&mut self, product_id: ProductId) -> Result<PendingRemoval, CartError> {
        if self.find(product_id).is_none() {
            return Err(CartError::NotInCart(product_id));
        }
        let snapshot = self.items.clone();
        self.items.retain(|i| i.product.id != product_id);
        Ok(PendingRemoval {
            product_id,
            snapshot,
        })
    }

    /// Apply the backend's answer to a removal. On failure the list is
    /// restored exactly as it was before [`Self::begin_remove`].
    ///
    /// # Errors
    ///
    /// Passes the backend error through.
    pub fn settle_removal(
        &mut self,
        pending: PendingRemoval,
        result: Result<(), ApiError>,
    ) -> Result<(), CartError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(product_id = %pending.product_id, error = %e, "Cart removal failed, restoring");
                self.items = pending.snapshot;
                Err(CartError::Api(e))
            }
        }
    }

    /// Remove a line, optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is unknown or the backend call fails.
    #[instrument(skip(self, client, credentials), fields(product_id = %product_id))]
    pub async fn remove(
        &mut self,
        client: &ShopClient,
        credentials: &BackendCredentials,
        product_id: ProductId,
    ) -> Result<(), CartError> {
        let pending = self.begin_remove(product_id)?;
        let result = client.remove_from_cart(credentials, product_id).await;
        self.settle_removal(pending, result)?;
        info!("Removed from cart");
        Ok(())
    }

    // =========================================================================
    // Quantity
    // =========================================================================

    /// Show `quantity` for `product_id` immediately.
    ///
    /// A quantity below one is rejected before anything changes, so the
    /// caller sends no request.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityRejected`] or [`CartError::NotInCart`].
    pub fn begin_set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<PendingQuantity, CartError> {
        let requested = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or(CartError::QuantityRejected)?;
        let item = self
            .find_mut(product_id)
            .ok_or(CartError::NotInCart(product_id))?;

        let previous = item.quantity;
        item.quantity = requested;
        Ok(PendingQuantity {
            product_id,
            previous,
            requested,
        })
    }

    /// Apply the backend's answer to a quantity change. On failure the line
    /// goes back to its previous quantity, unless a later change or removal
    /// has already replaced it.
    ///
    /// # Errors
    ///
    /// Passes the backend error through.
    pub fn settle_quantity(
        &mut self,
        pending: PendingQuantity,
        result: Result<(), ApiError>,
    ) -> Result<(), CartError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    product_id = %pending.product_id,
                    previous = pending.previous,
                    error = %e,
                    "Cart quantity update failed, reverting"
                );
                if let Some(item) = self.find_mut(pending.product_id)
                    && item.quantity == pending.requested
                {
                    item.quantity = pending.previous;
                }
                Err(CartError::Api(e))
            }
        }
    }

    /// Change a line's quantity, optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is below one (no request sent), the
    /// line is unknown, or the backend call fails.
    #[instrument(skip(self, client, credentials), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &mut self,
        client: &ShopClient,
        credentials: &BackendCredentials,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), CartError> {
        let pending = self.begin_set_quantity(product_id, quantity)?;
        let result = client
            .update_cart_quantity(credentials, product_id, pending.requested())
            .await;
        self.settle_quantity(pending, result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::ShopApi;
    use crate::testing::FakeShopApi;

    const CART: &str = r#"[
        {"id":1,"quantity":2,"product":{"pid":10,"pname":"Pen","price":20,"stock":9,"status":1}},
        {"id":2,"quantity":1,"product":{"pid":11,"pname":"Ink","price":55.5,"stock":3,"status":1}}
    ]"#;

    fn setup() -> (Arc<FakeShopApi>, ShopClient) {
        let fake = Arc::new(FakeShopApi::new());
        fake.respond("GET /user/cart", CART);
        let client = ShopClient::new(Arc::clone(&fake) as Arc<dyn ShopApi>, Duration::from_secs(1));
        (fake, client)
    }

    async fn loaded(client: &ShopClient) -> CartState {
        CartState::load(client, &BackendCredentials::anonymous())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_total_and_count() {
        let (_, client) = setup();
        let cart = loaded(&client).await;
        assert_eq!(cart.total().to_plain_string(), "95.50");
        assert_eq!(cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_quantity_below_one_sends_nothing() {
        let (fake, client) = setup();
        let mut cart = loaded(&client).await;
        let before = cart.clone();
        fake.clear_calls();

        for qty in [0, -3] {
            let err = cart
                .set_quantity(&client, &BackendCredentials::anonymous(), ProductId::new(10), qty)
                .await
                .unwrap_err();
            assert!(matches!(err, CartError::QuantityRejected));
        }
        assert!(fake.calls().is_empty());
        assert_eq!(cart, before);
    }

    #[tokio::test]
    async fn test_quantity_change_is_applied_and_sent() {
        let (fake, client) = setup();
        fake.respond("PUT /user/cart/update/10", "");
        let mut cart = loaded(&client).await;

        cart.set_quantity(&client, &BackendCredentials::anonymous(), ProductId::new(10), 5)
            .await
            .unwrap();
        assert_eq!(cart.quantity_of(ProductId::new(10)), Some(5));

        let calls = fake.calls_to("PUT /user/cart/update/10");
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].body().unwrap(),
            Some(serde_json::json!({ "quantity": 5 }))
        );
    }

    #[tokio::test]
    async fn test_quantity_failure_reverts() {
        let (fake, client) = setup();
        fake.fail("PUT /user/cart/update/10", 500, "boom");
        let mut cart = loaded(&client).await;

        let err = cart
            .set_quantity(&client, &BackendCredentials::anonymous(), ProductId::new(10), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Api(_)));
        assert_eq!(cart.quantity_of(ProductId::new(10)), Some(2));
    }

    #[test]
    fn test_stale_quantity_failure_keeps_newer_value() {
        let items: Vec<CartItem> = serde_json::from_str(CART).unwrap();
        let mut cart = CartState::new(items);

        let first = cart.begin_set_quantity(ProductId::new(10), 3).unwrap();
        let second = cart.begin_set_quantity(ProductId::new(10), 4).unwrap();
        cart.settle_quantity(second, Ok(())).unwrap();
        let _ = cart.settle_quantity(first, Err(ApiError::NotFound));

        assert_eq!(cart.quantity_of(ProductId::new(10)), Some(4));
    }

    #[test]
    fn test_removal_visible_before_settle_and_restored_on_failure() {
        let items: Vec<CartItem> = serde_json::from_str(CART).unwrap();
        let mut cart = CartState::new(items);
        let original = cart.clone();

        let pending = cart.begin_remove(ProductId::new(10)).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(10)), None);

        let err = cart
            .settle_removal(pending, Err(ApiError::from_status(500, "")))
            .unwrap_err();
        assert!(matches!(err, CartError::Api(_)));
        assert_eq!(cart, original);
    }

    #[tokio::test]
    async fn test_remove_success() {
        let (fake, client) = setup();
        fake.respond("DELETE /user/cart/remove/11", "");
        let mut cart = loaded(&client).await;

        cart.remove(&client, &BackendCredentials::anonymous(), ProductId::new(11))
            .await
            .unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total().to_plain_string(), "40.00");
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        let mut cart = CartState::default();
        assert!(matches!(
            cart.begin_remove(ProductId::new(1)),
            Err(CartError::NotInCart(_))
        ));
        assert!(matches!(
            cart.begin_set_quantity(ProductId::new(1), 2),
            Err(CartError::NotInCart(_))
        ));
    }
}
