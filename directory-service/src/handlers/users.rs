use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::user::{CreateUserRequest, PaginationQuery, UpdateUserRequest};
use crate::middleware::Caller;
use crate::services::ability::{policy_for, Action, AuthContext, Policy, Role, Subject};
use crate::services::projection::project_user;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

fn require(policy: &Policy, action: Action) -> Result<(), AppError> {
    if policy.can(action, Subject::User) {
        return Ok(());
    }
    Err(AppError::Forbidden(anyhow::anyhow!(
        "You don't have permission to {} User",
        action.as_str()
    )))
}

/// Mutations by a user-role caller are restricted to their own record,
/// regardless of the abstract grant.
fn ensure_owns(ctx: &AuthContext, target: Uuid, verb: &str) -> Result<(), AppError> {
    if let AuthContext::Jwt {
        role: Role::User,
        caller_id,
    } = ctx
    {
        if *caller_id != Some(target) {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "You can only {} your own record",
                verb
            )));
        }
    }
    Ok(())
}

fn parse_user_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid user id format")))
}

/// List users, shaped to the caller's visible fields.
#[utoipa::path(
    get,
    path = "/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Paginated user records"),
        (status = 400, description = "Invalid query parameters", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = crate::dtos::ErrorResponse),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    pagination.validate()?;

    let policy = policy_for(&ctx);
    require(&policy, Action::Read)?;

    let users = state
        .db
        .list_users(pagination.limit, pagination.offset)
        .await?;

    let mut result = Vec::with_capacity(users.len());
    for user in &users {
        let mut record = project_user(user, policy.visible_fields());
        if policy.can_view_emails() {
            let emails = state.db.list_user_emails(user.user_id).await?;
            record.insert("emails".to_string(), serde_json::to_value(emails)?);
        }
        result.push(Value::Object(record));
    }

    Ok(Json(Value::Array(result)))
}

/// Fetch one user by id, shaped to the caller's visible fields.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    responses(
        (status = 200, description = "The user record"),
        (status = 400, description = "Invalid user id format", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(&id)?;

    let policy = policy_for(&ctx);
    require(&policy, Action::Read)?;

    let user = state.db.get_user(user_id).await?.ok_or_else(|| {
        tracing::warn!(user_id = %user_id, "User not found");
        AppError::NotFound(anyhow::anyhow!("User not found"))
    })?;

    let mut record = project_user(&user, policy.visible_fields());
    if policy.can_view_emails() {
        let emails = state.db.list_user_emails(user_id).await?;
        record.insert("emails".to_string(), serde_json::to_value(emails)?);
    }

    Ok(Json(Value::Object(record)))
}

/// Create a user with its email set.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid request body", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = crate::dtos::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let policy = policy_for(&ctx);
    require(&policy, Action::Create)?;

    let (user, emails) = state.db.create_user(&req).await?;

    tracing::info!(user_id = %user.user_id, "POST /users - user created");

    let email_records: Vec<Value> = emails
        .iter()
        .map(|e| json!({ "email": e.email, "isPrimary": e.is_primary }))
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": {
                "id": user.user_id,
                "firstName": user.first_name,
                "lastName": user.last_name,
                "city": user.city,
                "emails": email_records,
            },
        })),
    ))
}

/// Update a user's scalar fields and replace its email set.
///
/// The email replacement is best-effort: the scalar update is already
/// committed, so a failure there is logged and does not fail the response.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated"),
        (status = 403, description = "Permission or ownership denial", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(&id)?;

    let policy = policy_for(&ctx);
    require(&policy, Action::Update)?;
    ensure_owns(&ctx, user_id, "update")?;

    state.db.update_user(user_id, &req).await?;

    let emails = req.emails.clone().unwrap_or_default();
    if let Err(e) = state.db.replace_user_emails(user_id, &emails).await {
        tracing::error!(error = %e, user_id = %user_id, "Failed to replace user emails");
    }

    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    tracing::info!(user_id = %user_id, "PUT /users/:id - user updated");

    let record = project_user(&user, policy.visible_fields());

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": Value::Object(record),
    })))
}

/// Delete a user and its email set.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Permission or ownership denial", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(&id)?;

    let policy = policy_for(&ctx);
    require(&policy, Action::Delete)?;
    ensure_owns(&ctx, user_id, "delete")?;

    state.db.delete_user(user_id).await?;

    tracing::info!(user_id = %user_id, "DELETE /users/:id - user deleted");

    Ok(Json(json!({
        "message": format!("User (id: {}) and related emails deleted successfully.", user_id),
    })))
}
