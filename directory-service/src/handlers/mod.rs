//! HTTP handlers for directory-service.

pub mod users;

pub use users::*;
