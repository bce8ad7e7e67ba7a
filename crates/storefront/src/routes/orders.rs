//! Order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use o2_shop_core::Order;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub nav: Nav,
    pub orders: Vec<Order>,
    pub error: Option<String>,
}

/// Display the shopper's orders.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<OrdersTemplate> {
    let (orders, error) = match state.client().orders(&auth.credentials).await {
        Ok(orders) => (orders, None),
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            (Vec::new(), Some(e.user_message("Failed to fetch orders")))
        }
    };

    Ok(OrdersTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        orders,
        error,
    })
}
