/// Session authentication middleware
///
/// Resolves the caller's session from `Authorization: Bearer <token>` or the
/// `amari_session` cookie and injects an [`AuthContext`] into the request
/// extensions, where handlers pick it up with `Extension<AuthContext>`.

use crate::{app::AppState, error::ApiError};
use amari_shared::auth::{
    authorization,
    session::{self, bearer_token, AuthContext, TokenError, SESSION_COOKIE},
};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

/// Picks the presented session token, bearer header first
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Rejects requests without a valid session
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers()).ok_or(TokenError::Missing)?;
    let auth = session::authenticate(&state.db, &token).await?;

    tracing::debug!(user_id = %auth.user_id, role = auth.role.as_str(), "Session authenticated");

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Attaches the session when one is presented and valid
///
/// Missing or stale sessions pass through anonymously; only database
/// failures are errors.
pub async fn optional_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(req.headers()) {
        match session::authenticate(&state.db, &token).await {
            Ok(auth) => {
                req.extensions_mut().insert(auth);
            }
            Err(TokenError::DatabaseError(err)) => return Err(err.into()),
            Err(_) => {}
        }
    }

    Ok(next.run(req).await)
}

/// Rejects non-admin sessions; must run after [`require_session`]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(TokenError::Missing)?;

    if let Err(err) = authorization::require_admin(auth) {
        tracing::warn!(user_id = %auth.user_id, "Non-admin attempted admin route");
        return Err(err.into());
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    const TOKEN: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, TOKEN)).unwrap(),
        );

        assert_eq!(session_token(&headers).as_deref(), Some(TOKEN));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, TOKEN)).unwrap(),
        );

        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_no_token() {
        assert!(session_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}=", SESSION_COOKIE)).unwrap(),
        );
        assert!(session_token(&headers).is_none());
    }
}
