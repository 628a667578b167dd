//! Role and attribute based permissions derived from the caller's identity.
//!
//! The grant table is evaluated as a pure function per request; nothing here
//! touches the store or carries state across requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity resolved from request credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Shared API key: read-only directory access, no caller identity.
    ApiKey,
    /// Bearer token: the subject's role plus, for user tokens, the id of the
    /// subject's own record.
    Jwt {
        role: Role,
        caller_id: Option<Uuid>,
    },
}

impl AuthContext {
    pub fn role(&self) -> Option<Role> {
        match self {
            AuthContext::ApiKey => None,
            AuthContext::Jwt { role, .. } => Some(*role),
        }
    }

    pub fn caller_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::ApiKey => None,
            AuthContext::Jwt { caller_id, .. } => *caller_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    User,
    All,
}

/// Scalar user fields, in canonical response order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    FirstName,
    LastName,
    City,
    CreatedAt,
    UpdatedAt,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::FirstName => "firstName",
            UserField::LastName => "lastName",
            UserField::City => "city",
            UserField::CreatedAt => "createdAt",
            UserField::UpdatedAt => "updatedAt",
        }
    }
}

pub const ALL_FIELDS: [UserField; 6] = [
    UserField::Id,
    UserField::FirstName,
    UserField::LastName,
    UserField::City,
    UserField::CreatedAt,
    UserField::UpdatedAt,
];

pub const PUBLIC_FIELDS: [UserField; 3] =
    [UserField::Id, UserField::FirstName, UserField::LastName];

/// Permission and field-visibility decisions for one request.
#[derive(Debug, Clone)]
pub struct Policy {
    grants: Vec<(Action, Subject)>,
    fields: &'static [UserField],
    view_emails: bool,
}

impl Policy {
    /// True if the grant set contains `(action, subject)` or `(manage, all)`.
    pub fn can(&self, action: Action, subject: Subject) -> bool {
        self.grants.contains(&(Action::Manage, Subject::All))
            || self.grants.contains(&(action, subject))
    }

    pub fn visible_fields(&self) -> &'static [UserField] {
        self.fields
    }

    /// Email sub-records are visible only to admins, including a user
    /// reading their own record.
    pub fn can_view_emails(&self) -> bool {
        self.view_emails
    }
}

/// Derive the caller's policy. All applicable grants are unioned.
pub fn policy_for(ctx: &AuthContext) -> Policy {
    let mut grants = Vec::new();

    if matches!(ctx, AuthContext::ApiKey) || ctx.role() == Some(Role::Anonymous) {
        grants.push((Action::Read, Subject::User));
    }

    if ctx.role() == Some(Role::User) {
        grants.push((Action::Read, Subject::User));
        grants.push((Action::Update, Subject::User));
        grants.push((Action::Delete, Subject::User));
    }

    if ctx.role() == Some(Role::Admin) {
        grants.push((Action::Manage, Subject::All));
    }

    let fields: &'static [UserField] = match ctx.role() {
        Some(Role::User) | Some(Role::Admin) => &ALL_FIELDS,
        _ => &PUBLIC_FIELDS,
    };

    Policy {
        grants,
        fields,
        view_emails: ctx.role() == Some(Role::Admin),
    }
}
