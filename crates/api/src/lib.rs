//! Cedar & Twine commerce API library.
//!
//! This crate provides the API server as a library, allowing its modules
//! to be reused by the operational CLI and exercised by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
