//! Typed facade over the [`ShopApi`] port.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use o2_shop_core::{
    CartItem, DeliveryStatus, Email, NewProduct, Order, OrderId, Product, ProductId,
    ProductUpdate, Profile, Role,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::wire::{
    CheckoutSessionRequest, LoginRequest, LoginResponse, PaymentVerification, ProfileUpdate,
    SessionDescriptor, SignUpRequest,
};
use super::{ApiError, ApiReply, BackendCredentials, Endpoint, SearchScope, ShopApi};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Role reported by the backend, if any.
    pub role: Option<Role>,
    /// Cookies the backend set on the login response.
    pub credentials: BackendCredentials,
}

/// Client for the O2 backend.
///
/// Public catalog reads are cached; seller catalog mutations clear the cache.
#[derive(Clone)]
pub struct ShopClient {
    inner: Arc<ShopClientInner>,
}

struct ShopClientInner {
    api: Arc<dyn ShopApi>,
    cache: Cache<CacheKey, CacheValue>,
}

impl ShopClient {
    /// Create a client over `api`, caching catalog reads for `cache_ttl`.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(ShopClientInner { api, cache }),
        }
    }

    /// Send one call, clearing the catalog cache after catalog mutations.
    async fn send(
        &self,
        credentials: &BackendCredentials,
        endpoint: Endpoint,
    ) -> Result<ApiReply, ApiError> {
        let invalidates = endpoint.changes_catalog();
        let reply = self.inner.api.call(credentials, endpoint).await?;
        if invalidates {
            debug!("Catalog changed, clearing cache");
            self.inner.cache.invalidate_all();
        }
        Ok(reply)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        credentials: &BackendCredentials,
        endpoint: Endpoint,
    ) -> Result<T, ApiError> {
        let reply = self.send(credentials, endpoint).await?;
        serde_json::from_str(&reply.body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %reply.body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    async fn execute(
        &self,
        credentials: &BackendCredentials,
        endpoint: Endpoint,
    ) -> Result<(), ApiError> {
        self.send(credentials, endpoint).await.map(|_| ())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All active listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(
            self.fetch(&BackendCredentials::anonymous(), Endpoint::Products)
                .await?,
        );
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// One product with its full image gallery.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Arc<Product>, ApiError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Arc<Product> = Arc::new(
            self.fetch(&BackendCredentials::anonymous(), Endpoint::Product(id))
                .await?,
        );
        self.inner
            .cache
            .insert(key, CacheValue::Product(Arc::clone(&product)))
            .await;
        Ok(product)
    }

    /// Keyword search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn search(
        &self,
        credentials: &BackendCredentials,
        scope: SearchScope,
        keyword: &str,
    ) -> Result<Vec<Product>, ApiError> {
        let endpoint = Endpoint::SearchProducts {
            scope,
            keyword: keyword.to_string(),
        };
        let results: Option<Vec<Product>> = self.fetch(credentials, endpoint).await?;
        Ok(results.unwrap_or_default())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the payload is not a list of items.
    #[instrument(skip(self, credentials))]
    pub async fn cart(&self, credentials: &BackendCredentials) -> Result<Vec<CartItem>, ApiError> {
        self.fetch(credentials, Endpoint::Cart).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        credentials: &BackendCredentials,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::AddToCart(product_id))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(product_id = %product_id))]
    pub async fn update_cart_quantity(
        &self,
        credentials: &BackendCredentials,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.execute(
            credentials,
            Endpoint::UpdateCartQuantity {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        credentials: &BackendCredentials,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::RemoveFromCart(product_id))
            .await
    }

    // =========================================================================
    // Orders & checkout
    // =========================================================================

    /// The shopper's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn orders(&self, credentials: &BackendCredentials) -> Result<Vec<Order>, ApiError> {
        self.fetch(credentials, Endpoint::Orders).await
    }

    /// Product as seen by a logged-in buyer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(product_id = %id))]
    pub async fn checkout_product(
        &self,
        credentials: &BackendCredentials,
        id: ProductId,
    ) -> Result<Product, ApiError> {
        self.fetch(credentials, Endpoint::CheckoutProduct(id)).await
    }

    /// Create the order and, for online payment, a gateway session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, request), fields(mode = %request.mode))]
    pub async fn create_checkout_session(
        &self,
        credentials: &BackendCredentials,
        request: CheckoutSessionRequest,
    ) -> Result<SessionDescriptor, ApiError> {
        let reply = self
            .send(credentials, Endpoint::CheckoutSession(request))
            .await?;
        if reply.body.trim().is_empty() {
            return Ok(SessionDescriptor::default());
        }
        Ok(serde_json::from_str(&reply.body)?)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the payment signature.
    #[instrument(skip(self, credentials, verification))]
    pub async fn verify_payment(
        &self,
        credentials: &BackendCredentials,
        verification: PaymentVerification,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::VerifyPayment(verification))
            .await
    }

    // =========================================================================
    // Seller
    // =========================================================================

    /// The seller's own listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn seller_products(
        &self,
        credentials: &BackendCredentials,
    ) -> Result<Vec<Product>, ApiError> {
        self.fetch(credentials, Endpoint::SellerProducts).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, product), fields(name = %product.pname))]
    pub async fn add_product(
        &self,
        credentials: &BackendCredentials,
        product: NewProduct,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::AddProduct(product))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        credentials: &BackendCredentials,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::UpdateProduct { id, update })
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, photo), fields(product_id = %id, bytes = photo.len()))]
    pub async fn add_product_photo(
        &self,
        credentials: &BackendCredentials,
        id: ProductId,
        photo: String,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::AddProductPhoto { id, photo })
            .await
    }

    /// Orders placed for the seller's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn seller_orders(
        &self,
        credentials: &BackendCredentials,
    ) -> Result<Vec<Order>, ApiError> {
        self.fetch(credentials, Endpoint::SellerOrders).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        credentials: &BackendCredentials,
        id: OrderId,
        status: DeliveryStatus,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::UpdateOrderStatus { id, status })
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn delete_order(
        &self,
        credentials: &BackendCredentials,
        id: OrderId,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::DeleteOrder(id)).await
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Log in and capture the backend's session cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    #[instrument(skip(self, request), fields(email = %request.gmail))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, ApiError> {
        let reply = self
            .send(&BackendCredentials::anonymous(), Endpoint::Login(request))
            .await?;

        let response: LoginResponse = if reply.body.trim().is_empty() {
            LoginResponse::default()
        } else {
            serde_json::from_str(&reply.body)?
        };

        let credentials =
            BackendCredentials::from_set_cookie(reply.set_cookies.iter().map(String::as_str));
        let role = response.role.or_else(|| {
            credentials
                .get("role")
                .and_then(|r| r.parse::<Role>().ok())
        });

        Ok(LoginOutcome { role, credentials })
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<(), ApiError> {
        self.execute(&BackendCredentials::anonymous(), Endpoint::SignUp(request))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn logout(&self, credentials: &BackendCredentials) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::Logout).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the credentials are stale.
    #[instrument(skip(self, credentials))]
    pub async fn profile(&self, credentials: &BackendCredentials) -> Result<Profile, ApiError> {
        self.fetch(credentials, Endpoint::Profile).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, update))]
    pub async fn update_profile(
        &self,
        credentials: &BackendCredentials,
        update: ProfileUpdate,
    ) -> Result<(), ApiError> {
        self.execute(credentials, Endpoint::UpdateProfile(update))
            .await
    }

    // =========================================================================
    // Newsletter
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn subscribe(&self, email: Email) -> Result<(), ApiError> {
        self.execute(&BackendCredentials::anonymous(), Endpoint::Subscribe(email))
            .await
    }
}
