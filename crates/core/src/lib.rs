//! Metadots Core - Shared domain types.
//!
//! This crate provides the types exchanged with the Metadots backend and
//! shared by every client of it:
//! - `storefront` - Client library and route-guarding gateway
//! - `cli` - Command-line client for shoppers and administrators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Anything here can be unit tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, emails, roles, carts, products, orders and
//!   the checkout wire format

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
