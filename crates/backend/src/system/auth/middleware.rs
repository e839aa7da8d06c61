use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::jwt::JwtKeys;
use crate::shared::metadata::error::AdminError;

/// Middleware that requires a valid bearer token.
/// Rejects before the handler runs, so no query executes for anonymous requests.
pub async fn require_auth(
    State(keys): State<Arc<JwtKeys>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AdminError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AdminError::Unauthenticated)?;

    let claims = keys.validate_token(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {:#}", e);
        AdminError::Unauthenticated
    })?;

    // Claims are read back by the CurrentUser extractor
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
