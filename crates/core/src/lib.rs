//! O2 Shop Core - Shared domain types.
//!
//! This crate provides the records exchanged with the shop backend:
//! - `storefront` - Server-rendered shop and seller console
//! - `integration-tests` - Behavioural tests against the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The backend
//! is authoritative for every record, so these types do little beyond shaping
//! and coercing the JSON the backend sends.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, emails, statuses and the shop records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
