use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::services::ability::AuthContext;
use crate::AppState;
use service_core::error::AppError;

/// Middleware resolving request credentials into an [`AuthContext`].
///
/// An `x-api-key` header, when present, is authoritative: a bad key is
/// rejected without falling through to the bearer check.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(value) = req.headers().get("x-api-key") {
        let api_key = value
            .to_str()
            .map_err(|_| unauthorized("Invalid API key"))?;

        if api_key != state.config.security.api_key {
            tracing::warn!("Failed API key authentication attempt");
            return Err(unauthorized("Invalid API key"));
        }

        req.extensions_mut().insert(AuthContext::ApiKey);
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => return Err(unauthorized("API key or bearer token is required")),
    };

    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    req.extensions_mut().insert(AuthContext::Jwt {
        role: claims.role,
        caller_id: claims.sub,
    });

    Ok(next.run(req).await)
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized(anyhow::anyhow!(message.to_string()))
}

/// Extractor handing handlers the resolved [`AuthContext`].
pub struct Caller(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<AuthContext>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth context missing from request extensions"
            ))
        })?;

        Ok(Caller(ctx.clone()))
    }
}
