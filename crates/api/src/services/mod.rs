//! External collaborators: password hashing, mail transport, media host.

pub mod auth;
pub mod email;
pub mod media;
