use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

fn default_limit() -> i64 {
    10
}

/// Pagination for `GET /users`. Out-of-range values are rejected before any
/// store access.
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    #[param(example = 10)]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "offset must be non-negative"))]
    #[param(example = 0)]
    pub offset: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailInput {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "firstName must not be empty"))]
    #[schema(example = "Ada")]
    pub first_name: String,

    #[validate(length(min = 1, message = "lastName must not be empty"))]
    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[schema(example = "London")]
    pub city: Option<String>,

    #[validate(nested)]
    pub emails: Vec<EmailInput>,
}

/// Same shape as [`CreateUserRequest`] with every field optional. An omitted
/// scalar keeps its current value. The email list always replaces the
/// existing set: omitting `emails` clears it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "firstName must not be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "lastName must not be empty"))]
    pub last_name: Option<String>,

    pub city: Option<String>,

    #[validate(nested)]
    pub emails: Option<Vec<EmailInput>>,
}
