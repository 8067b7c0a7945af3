//! Bearer-token auth. Tokens are the opaque UUIDs handed out when an
//! account is opened; the middleware resolves one to its account and
//! stashes the account in request extensions for the handlers.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// The authenticated caller, as seen by handlers behind this middleware.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub crate::domain::Account);

pub async fn require_account(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    let account = state
        .store
        .find_by_token(token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid token".to_string()))?;

    req.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<Uuid> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    token.parse().ok()
}
