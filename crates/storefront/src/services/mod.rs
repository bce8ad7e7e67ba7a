//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart mirror with optimistic quantity/removal sync
//! - `seller_orders` - Seller order console with optimistic status changes
//! - `checkout` - Order placement and payment widget hand-off
//! - `catalog` - Filters, sorting, search and the image gallery
//! - `photos` - Product photo and avatar uploads

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod photos;
pub mod seller_orders;

pub use cart::{CartError, CartState};
pub use catalog::{CatalogQuery, Gallery, SearchOutcome, SortOrder};
pub use checkout::{Checkout, CheckoutError, CheckoutForm, CheckoutOutcome, PaymentWidget};
pub use photos::{Photo, PhotoError};
pub use seller_orders::{SellerOrderError, SellerOrders};
