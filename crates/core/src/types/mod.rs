//! Core types for O2 Shop.
//!
//! Wire names follow the backend (`pid`, `pname`, `deDate`, ...); Rust field
//! names are the readable versions.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod profile;
pub mod status;

pub use cart::CartItem;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::Order;
pub use price::Price;
pub use product::{NewProduct, Product, ProductUpdate};
pub use profile::Profile;
pub use status::*;
