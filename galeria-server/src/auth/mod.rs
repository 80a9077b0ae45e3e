//! HTTP Basic authentication for the gallery routes.

pub mod basic;
pub mod middleware;

pub use basic::{BasicCredentials, Credentials, REALM, parse_basic_authorization};
pub use middleware::require_basic_auth;
