//! Data models local to the API crate.
//!
//! Domain types shared with the CLI and tests live in `cedar-twine-core`;
//! this module holds models only the HTTP layer needs.

pub mod user;

pub use user::User;
