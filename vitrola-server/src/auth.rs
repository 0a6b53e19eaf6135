use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
};

use crate::ServerContext;

/// Proof that the request carries the admin token
pub struct AdminSession;

#[async_trait]
impl FromRequestParts<ServerContext> for AdminSession {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization"))?;

        let token = bearer_token(authorization)
            .ok_or((StatusCode::BAD_REQUEST, "Authorization must be Bearer"))?;

        if token != context.admin_token.as_ref() {
            return Err((StatusCode::UNAUTHORIZED, "Invalid token"));
        }

        Ok(Self)
    }
}

fn bearer_token(authorization: &str) -> Option<&str> {
    let parts: Vec<_> = authorization.split_ascii_whitespace().collect();

    match parts.as_slice() {
        ["Bearer", token] => Some(*token),
        _ => None,
    }
}
