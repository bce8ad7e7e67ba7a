//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use o2_shop_core::{Product, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Nav;
use crate::services::Gallery;
use crate::state::AppState;

/// Query parameters of the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    /// Gallery index; wraps past the last image.
    #[serde(default)]
    pub image: usize,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: Nav,
    pub product: Product,
    pub gallery: Gallery,
    /// Image at the gallery index, if the product has any.
    pub image: Option<String>,
    /// Shoppers may add to cart and buy an active product. Sellers browse only.
    pub can_buy: bool,
}

/// Display a product.
///
/// # Errors
///
/// Returns 404 if the backend does not know the product.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Path(id): Path<ProductId>,
    Query(query): Query<DetailQuery>,
) -> Result<ProductShowTemplate> {
    let product = state.client().product(id).await?;
    let nav = Nav::new(&session, auth.user).await;

    let gallery = Gallery::new(query.image, product.images.len());
    let image = product.images.get(gallery.index).cloned();
    let can_buy = product.status.is_active() && !nav.is_seller();

    Ok(ProductShowTemplate {
        nav,
        product: (*product).clone(),
        gallery,
        image,
        can_buy,
    })
}
