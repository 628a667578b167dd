pub mod email;
pub mod user;

pub use email::{EmailRecord, UserEmail};
pub use user::User;
