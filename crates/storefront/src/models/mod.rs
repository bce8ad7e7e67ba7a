//! Session-held models for the storefront.
//!
//! The backend owns every shop record; the storefront keeps only who is
//! signed in, the backend cookies that prove it, and short-lived UI state.

pub mod session;

pub use session::{CurrentUser, Flash, FlashKind, keys as session_keys};
