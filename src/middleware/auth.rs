use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::verify_jwt;
use crate::domain::{Principal, Role};
use crate::error::ApiError;

/// JWT authentication middleware. Validates the bearer token and injects the
/// verified principal into the request; everything behind it can trust the
/// (role, user_id) pair.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let claims = verify_jwt(&token).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let role: Role = claims
        .role
        .parse()
        .map_err(|e: String| ApiError::unauthorized(e))?;

    request.extensions_mut().insert(Principal {
        user_id: claims.user_id,
        role,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
