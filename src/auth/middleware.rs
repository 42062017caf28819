//! Authentication middleware

use crate::auth::{Claims, TokenCodec};
use crate::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthenticated("Not authenticated".to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| Error::Unauthenticated("Not authenticated".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(Error::Unauthenticated("Not authenticated".to_string())),
    }
}

/// Verify the request's bearer token and decode its claims
pub fn extract_claims(codec: &TokenCodec, headers: &HeaderMap) -> Result<Claims> {
    let token = bearer_token(headers)?;
    Ok(codec.verify(token)?)
}

/// Middleware rejecting requests without a valid bearer token.
/// Decoded claims are inserted into request extensions.
pub async fn require_auth(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Error> {
    let claims = extract_claims(&codec, req.headers())?;
    tracing::debug!("Authenticated {} ({})", claims.sub, claims.role);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
