//! User entity - directory records.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A directory user row. Owns zero-or-more [`super::UserEmail`] rows;
/// ownership is exclusive and cascades on delete.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub city: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}
