//! Catalog landing page: promotional banners plus the product grid.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use o2_shop_core::Product;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Nav;
use crate::services::SortOrder;
use crate::services::catalog::{CatalogQuery, categories};
use crate::state::AppState;

// =============================================================================
// Banner Configuration (static promotions for the carousel)
// =============================================================================

/// A single slide in the banner carousel.
#[derive(Debug, Clone, Copy)]
pub struct Banner {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub image_path: &'static str,
}

pub const BANNERS: [Banner; 3] = [
    Banner {
        title: "Big Festive Sale!",
        subtitle: "Up to 60% off on all electronics",
        image_path: "/static/images/banner-festive.svg",
    },
    Banner {
        title: "Connect Your World",
        subtitle: "Flat 40% off on top brands",
        image_path: "/static/images/banner-connect.svg",
    },
    Banner {
        title: "Free Delivery on Orders Above ₹499",
        subtitle: "Limited-time offer for all categories!",
        image_path: "/static/images/banner-delivery.svg",
    },
];

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub banners: &'static [Banner],
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub selected_category: String,
    pub sort: SortOrder,
    pub sort_options: [SortOrder; 4],
    pub error: Option<String>,
}

/// Display the catalog.
///
/// A backend failure renders the page with an inline alert instead of the
/// grid.
#[instrument(skip(state, session, auth))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> HomeTemplate {
    let nav = Nav::new(&session, auth.user).await;

    let (products, categories, error) = match state.client().products().await {
        Ok(all) => (query.apply(&all), categories(&all), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load catalog");
            (
                Vec::new(),
                Vec::new(),
                Some(e.user_message("Failed to load products. Please try again.")),
            )
        }
    };

    HomeTemplate {
        nav,
        banners: &BANNERS,
        products,
        categories,
        selected_category: query.category().unwrap_or_default().to_string(),
        sort: query.sort,
        sort_options: SortOrder::ALL,
        error,
    }
}
