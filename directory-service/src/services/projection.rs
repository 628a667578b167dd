//! Shapes user records to the caller's visible field set.

use serde_json::{Map, Value};

use crate::models::User;
use crate::services::ability::UserField;

/// Project a full user record onto `fields`, preserving the canonical field
/// order. The source record is never mutated; a field that cannot be
/// serialized is omitted rather than raising an error.
pub fn project_user(user: &User, fields: &[UserField]) -> Map<String, Value> {
    let mut out = Map::new();

    for field in fields {
        let value = match field {
            UserField::Id => Some(Value::String(user.user_id.to_string())),
            UserField::FirstName => Some(Value::String(user.first_name.clone())),
            UserField::LastName => Some(Value::String(user.last_name.clone())),
            UserField::City => Some(
                user.city
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            ),
            UserField::CreatedAt => serde_json::to_value(user.created_utc).ok(),
            UserField::UpdatedAt => serde_json::to_value(user.updated_utc).ok(),
        };

        if let Some(value) = value {
            out.insert(field.as_str().to_string(), value);
        }
    }

    out
}
