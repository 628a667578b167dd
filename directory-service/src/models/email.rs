//! Email entity - addresses owned by a user record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// An email row. `is_primary` is advisory metadata; at-most-one-primary is
/// not enforced at the data layer.
#[derive(Debug, Clone, FromRow)]
pub struct UserEmail {
    pub email_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub is_primary: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: Option<DateTime<Utc>>,
}

/// The email fields exposed in admin read responses.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub email: String,
    pub is_primary: bool,
}
