//! Seller order console.
//!
//! Status changes are optimistic: the new status shows at once, one `PUT`
//! is sent, and a failure triggers a full refetch of the list. Deletion is
//! pessimistic. There is no concurrency token, so two sellers editing the
//! same order overwrite each other.

use o2_shop_core::{DeliveryStatus, Order, OrderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, BackendCredentials, ShopClient};

/// Errors from seller order mutations.
#[derive(Debug, Error)]
pub enum SellerOrderError {
    /// The order is not in the mirrored list.
    #[error("Order {0} not found")]
    UnknownOrder(OrderId),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Pending status change.
#[derive(Debug)]
#[must_use = "settle the status change with the backend's answer"]
pub struct PendingStatusChange {
    order_id: OrderId,
    previous: DeliveryStatus,
    requested: DeliveryStatus,
}

impl PendingStatusChange {
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[must_use]
    pub const fn requested(&self) -> &DeliveryStatus {
        &self.requested
    }
}

/// Orders for the seller's products, as last seen by this view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerOrders {
    orders: Vec<Order>,
}

impl SellerOrders {
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Fetch the seller's orders.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] for non-seller accounts.
    pub async fn load(
        client: &ShopClient,
        credentials: &BackendCredentials,
    ) -> Result<Self, ApiError> {
        Ok(Self::new(client.seller_orders(credentials).await?))
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    /// Show `status` on the order immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SellerOrderError::UnknownOrder`] if no order matches.
    pub fn begin_status_change(
        &mut self,
        order_id: OrderId,
        status: DeliveryStatus,
    ) -> Result<PendingStatusChange, SellerOrderError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(SellerOrderError::UnknownOrder(order_id))?;

        let previous = std::mem::replace(&mut order.status, status.clone());
        Ok(PendingStatusChange {
            order_id,
            previous,
            requested: status,
        })
    }

    /// Apply the backend's answer to a status change.
    ///
    /// On failure the whole list is refetched. If the refetch fails too, the
    /// order goes back to its previous status locally.
    ///
    /// # Errors
    ///
    /// Passes the original backend error through.
    pub async fn settle_status_change(
        &mut self,
        client: &ShopClient,
        credentials: &BackendCredentials,
        pending: PendingStatusChange,
        result: Result<(), ApiError>,
    ) -> Result<(), SellerOrderError> {
        let Err(e) = result else {
            return Ok(());
        };

        warn!(order_id = %pending.order_id, error = %e, "Status update failed, resyncing");
        match client.seller_orders(credentials).await {
            Ok(orders) => self.orders = orders,
            Err(refetch) => {
                warn!(error = %refetch, "Resync failed, reverting locally");
                if let Some(order) = self.orders.iter_mut().find(|o| o.id == pending.order_id)
                    && order.status == pending.requested
                {
                    order.status = pending.previous;
                }
            }
        }
        Err(SellerOrderError::Api(e))
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is unknown or the backend call fails.
    #[instrument(skip(self, client, credentials), fields(order_id = %order_id, status = %status))]
    pub async fn change_status(
        &mut self,
        client: &ShopClient,
        credentials: &BackendCredentials,
        order_id: OrderId,
        status: DeliveryStatus,
    ) -> Result<(), SellerOrderError> {
        let pending = self.begin_status_change(order_id, status)?;
        let result = client
            .update_order_status(credentials, order_id, pending.requested().clone())
            .await;
        self.settle_status_change(client, credentials, pending, result)
            .await?;
        info!("Order status updated");
        Ok(())
    }

    /// Delete an order, then drop it from the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails; the list is unchanged.
    #[instrument(skip(self, client, credentials), fields(order_id = %order_id))]
    pub async fn delete(
        &mut self,
        client: &ShopClient,
        credentials: &BackendCredentials,
        order_id: OrderId,
    ) -> Result<(), SellerOrderError> {
        client.delete_order(credentials, order_id).await?;
        self.orders.retain(|o| o.id != order_id);
        info!("Order deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::api::{Endpoint, ShopApi};
    use crate::testing::FakeShopApi;

    const ORDERS: &str = r#"[
        {"id":42,"pid":3,"pname":"Mouse","quantity":1,"price":499,"mode":"COD","status":"Confirmed","address":"x"},
        {"id":43,"pid":4,"pname":"Desk","quantity":1,"price":4999,"mode":"ONLINE","status":"Paid","address":"y"}
    ]"#;

    fn setup() -> (Arc<FakeShopApi>, ShopClient) {
        let fake = Arc::new(FakeShopApi::new());
        fake.respond("GET /seller/myOrders", ORDERS);
        let client = ShopClient::new(Arc::clone(&fake) as Arc<dyn ShopApi>, Duration::from_secs(1));
        (fake, client)
    }

    #[tokio::test]
    async fn test_status_change_sends_one_put_and_updates_locally() {
        let (fake, client) = setup();
        fake.respond("PUT /seller/orders/42/status", "");
        let creds = BackendCredentials::anonymous();
        let mut orders = SellerOrders::load(&client, &creds).await.unwrap();
        fake.clear_calls();

        orders
            .change_status(&client, &creds, OrderId::new(42), DeliveryStatus::Delivered)
            .await
            .unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            Endpoint::UpdateOrderStatus {
                id: OrderId::new(42),
                status: DeliveryStatus::Delivered
            }
        );
        assert_eq!(calls[0].body().unwrap(), Some(json!({ "status": "Delivered" })));
        assert_eq!(
            orders.get(OrderId::new(42)).unwrap().status,
            DeliveryStatus::Delivered
        );
    }

    #[tokio::test]
    async fn test_status_change_is_visible_before_settle() {
        let (_, client) = setup();
        let creds = BackendCredentials::anonymous();
        let mut orders = SellerOrders::load(&client, &creds).await.unwrap();

        let pending = orders
            .begin_status_change(OrderId::new(42), DeliveryStatus::Shipped)
            .unwrap();
        assert_eq!(
            orders.get(OrderId::new(42)).unwrap().status,
            DeliveryStatus::Shipped
        );
        orders
            .settle_status_change(&client, &creds, pending, Ok(()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_status_change_refetches_list() {
        let (fake, client) = setup();
        fake.fail("PUT /seller/orders/42/status", 500, "");
        let creds = BackendCredentials::anonymous();
        let mut orders = SellerOrders::load(&client, &creds).await.unwrap();
        fake.clear_calls();

        let err = orders
            .change_status(&client, &creds, OrderId::new(42), DeliveryStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, SellerOrderError::Api(_)));

        let routes: Vec<String> = fake.calls().iter().map(Endpoint::route).collect();
        assert_eq!(
            routes,
            vec!["PUT /seller/orders/42/status", "GET /seller/myOrders"]
        );
        assert_eq!(
            orders.get(OrderId::new(42)).unwrap().status,
            DeliveryStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_failed_resync_reverts_locally() {
        let (fake, client) = setup();
        let creds = BackendCredentials::anonymous();
        let mut orders = SellerOrders::load(&client, &creds).await.unwrap();
        fake.fail("PUT /seller/orders/43/status", 500, "");
        fake.fail("GET /seller/myOrders", 502, "");

        let _ = orders
            .change_status(&client, &creds, OrderId::new(43), DeliveryStatus::Shipped)
            .await;
        assert_eq!(
            orders.get(OrderId::new(43)).unwrap().status,
            DeliveryStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_unknown_order_sends_nothing() {
        let (fake, client) = setup();
        let creds = BackendCredentials::anonymous();
        let mut orders = SellerOrders::load(&client, &creds).await.unwrap();
        fake.clear_calls();

        let err = orders
            .change_status(&client, &creds, OrderId::new(99), DeliveryStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, SellerOrderError::UnknownOrder(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_pessimistic() {
        let (fake, client) = setup();
        let creds = BackendCredentials::anonymous();
        let mut orders = SellerOrders::load(&client, &creds).await.unwrap();

        fake.fail_once("DELETE /seller/orders/43", 500, "");
        assert!(orders.delete(&client, &creds, OrderId::new(43)).await.is_err());
        assert_eq!(orders.orders().len(), 2);

        fake.respond("DELETE /seller/orders/43", "");
        orders.delete(&client, &creds, OrderId::new(43)).await.unwrap();
        assert_eq!(orders.orders().len(), 1);
        assert!(orders.get(OrderId::new(43)).is_none());
    }
}
