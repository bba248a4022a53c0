//! Authorization gate applied in front of every protected route.
//!
//! `require_claims` verifies the bearer token and attaches the verified
//! claims; `require_user` additionally resolves the claims subject to an
//! internal user row. Both fail closed with a single AUTHENTICATION_ERROR
//! regardless of which token check failed, so the response gives an
//! attacker no oracle; the precise cause is logged at debug level only.
//! The claims-to-user binding lives in request extensions and is never
//! cached across requests.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::auth::VerifiedClaims;
use crate::database::models::{PlanTier, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Request-scoped identity of the authenticated, registered user.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub firebase_uid: String,
    pub email: String,
    pub plan: PlanTier,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            firebase_uid: user.firebase_uid.clone(),
            email: user.email.clone(),
            plan: user.plan,
        }
    }
}

/// Gate for routes that need a valid token but no user row yet.
/// Registration is the only such route.
pub async fn require_claims(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = verified_claims(&state, request.headers()).await?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Gate for user-scoped routes: valid token plus an existing user row.
/// A verified subject with no registration is still unauthenticated here.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = verified_claims(&state, request.headers()).await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE firebase_uid = ?")
        .bind(&claims.subject)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| {
            tracing::debug!("no user registered for subject {}", claims.subject);
            ApiError::authentication("User is not registered")
        })?;

    request.extensions_mut().insert(CurrentUser::from(&user));
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

async fn verified_claims(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<VerifiedClaims, ApiError> {
    let token = bearer_token(headers)?;

    state
        .verifier
        .verify(&token, Utc::now())
        .await
        .map_err(|err| {
            tracing::debug!("token rejected: {}", err);
            ApiError::authentication("Invalid authentication token")
        })
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Missing authentication token"))?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::authentication(
            "Authorization header must use the Bearer token format",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let token = bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_header() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn rejects_non_bearer_schemes_and_empty_tokens() {
        assert!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers_with("Bearer ")).is_err());
        assert!(bearer_token(&headers_with("bearer abc")).is_err());
    }
}
