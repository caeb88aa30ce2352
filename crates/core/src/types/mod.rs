//! Core types for the Metadots storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod credential;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod principal;
pub mod status;
pub mod timestamp;

pub use admin::{Insights, NewUser, ProductSales, UserList, UserPatch, UserRecord};
pub use cart::{Cart, CartLine};
pub use catalog::{Categories, Product, ProductInput, ProductPage, ProductPatch, ProductQuery, ProductSort};
pub use checkout::{
    CheckoutItem, CheckoutReceipt, CheckoutRequest, CheckoutSession, CheckoutSessionRequest,
};
pub use credential::{Credentials, Registration, ValidationError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem, OrderList};
pub use price::Price;
pub use principal::Principal;
pub use status::*;
