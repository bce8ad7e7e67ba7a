//! Catalog browsing: filters, sorting, search and the image gallery.

use std::collections::BTreeSet;

use o2_shop_core::{Product, Role};
use serde::Deserialize;
use tracing::instrument;

use crate::api::{ApiError, BackendCredentials, SearchScope, ShopClient};

/// Sort order for product grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Backend order.
    #[default]
    Featured,
    PriceLowHigh,
    PriceHighLow,
    NameAz,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::Featured,
        Self::PriceLowHigh,
        Self::PriceHighLow,
        Self::NameAz,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLowHigh => "price-low-high",
            Self::PriceHighLow => "price-high-low",
            Self::NameAz => "name-az",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceLowHigh => "Price: Low to High",
            Self::PriceHighLow => "Price: High to Low",
            Self::NameAz => "Name: A to Z",
        }
    }
}

/// Query parameters of the catalog page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl CatalogQuery {
    /// Selected category, ignoring blanks.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Filter and sort `products` for display.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut shown: Vec<Product> = products
            .iter()
            .filter(|p| {
                self.category()
                    .is_none_or(|c| p.category.as_deref() == Some(c))
            })
            .cloned()
            .collect();

        match self.sort {
            SortOrder::Featured => {}
            SortOrder::PriceLowHigh => shown.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceHighLow => shown.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::NameAz => {
                shown.sort_by_cached_key(|p| p.name.to_lowercase());
            }
        }
        shown
    }
}

/// Distinct categories present in `products`, sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .filter_map(|p| p.category.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Outcome of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query; nothing was requested.
    Skipped,
    Results(Vec<Product>),
}

/// Search the catalog visible to `role`.
///
/// Sellers search their own listings; everyone else the public catalog.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip(client, credentials))]
pub async fn search(
    client: &ShopClient,
    credentials: &BackendCredentials,
    role: Option<Role>,
    query: &str,
) -> Result<SearchOutcome, ApiError> {
    let keyword = query.trim();
    if keyword.is_empty() {
        return Ok(SearchOutcome::Skipped);
    }
    let scope = if role.is_some_and(|r| r.is_seller()) {
        SearchScope::Seller
    } else {
        SearchScope::Public
    };
    let results = client.search(credentials, scope, keyword).await?;
    Ok(SearchOutcome::Results(results))
}

/// Position in a product's image gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gallery {
    pub index: usize,
    pub len: usize,
}

impl Gallery {
    /// Clamp a requested index into `0..len`, wrapping past the end.
    #[must_use]
    pub const fn new(requested: usize, len: usize) -> Self {
        let index = if len == 0 { 0 } else { requested % len };
        Self { index, len }
    }

    #[must_use]
    pub const fn has_many(&self) -> bool {
        self.len > 1
    }

    #[must_use]
    pub const fn next(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            (self.index + 1) % self.len
        }
    }

    #[must_use]
    pub const fn prev(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            (self.index + self.len - 1) % self.len
        }
    }
}
