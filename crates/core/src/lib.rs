//! Cedar & Twine Core - Shared domain library.
//!
//! This crate provides the domain model used across all Cedar & Twine
//! components:
//! - `api` - Public commerce API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and the state transitions defined on
//! them - no I/O, no database access, no HTTP clients. Every timestamped
//! transition takes the clock value as an argument, so the whole order
//! lifecycle is testable without a running system.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, owners, and statuses
//! - [`cart`] - Cart aggregate: line items, quantity updates, guest-cart merge
//! - [`checkout`] - Checkout session state machine (pending -> paid -> finalized)
//! - [`order`] - Order records materialized from finalized checkouts
//! - [`product`] - Catalog entries and the snapshot taken at add-to-cart time

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod order;
pub mod product;
pub mod types;

pub use types::*;
