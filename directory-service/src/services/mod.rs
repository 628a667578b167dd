//! Services layer for directory-service.
//!
//! Identity and permission engines, field projection, and the user
//! aggregate store.

pub mod ability;
mod database;
mod jwt;
pub mod projection;

pub use database::Database;
pub use jwt::{AccessTokenClaims, JwtService};
