//! Metadots Storefront library.
//!
//! Client-side lifecycle of a storefront session against the Metadots REST
//! backend: the typed API client, cart synchronisation across independently
//! mounted views, the checkout state machine, the route guard, and the axum
//! gateway that puts the guard in front of page endpoints.
//!
//! # Modules
//!
//! - [`api`] - REST client and the explicit [`api::Session`]
//! - [`events`] - fire-and-forget `cart:changed` / `auth:changed` bus
//! - [`mount`] - mount scope that discards late async completions
//! - [`account`] - login, logout and "who am I"
//! - [`cart`] - cart store and count badge
//! - [`checkout`] - checkout state machine and URL classification
//! - [`guard`] - route guard policy and evaluation
//! - [`routes`] / [`middleware`] - the gateway

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod events;
pub mod guard;
pub mod middleware;
pub mod mount;
pub mod routes;
pub mod state;

pub use routes::app;
