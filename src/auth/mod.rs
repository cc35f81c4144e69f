//! Authentication for the todo service
//!
//! Password hashing, session token issue/verification/revocation, and the
//! `AuthenticatedUser` extractor every protected route goes through.

pub mod extractor;
pub mod handlers;
mod service;

pub use extractor::{AuthenticatedUser, AUTH_HEADER};
pub use service::{AuthService, Claims};
