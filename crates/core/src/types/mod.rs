//! Core types for Cedar & Twine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod owner;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use owner::{GuestId, GuestIdError, Owner};
pub use status::*;
