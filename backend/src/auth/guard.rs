use axum::http::{header, HeaderMap};

use crate::auth::session::SessionCodec;
use crate::db::users::{StoreError, UserStore};
use crate::models::user::User;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Invalid session")]
    InvalidSession,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pull the session token out of the request's Cookie header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in cookie_header.split(';') {
        if let Ok(parsed) = cookie::Cookie::parse(part.trim()) {
            if parsed.name() == SESSION_COOKIE {
                return Some(parsed.value().to_string());
            }
        }
    }

    None
}

/// Resolve the user behind a request's session cookie.
///
/// Lookup is by id first, falling back to email for tokens minted before the
/// current id claim existed.
pub async fn authenticate(
    headers: &HeaderMap,
    codec: &SessionCodec,
    store: &dyn UserStore,
) -> Result<User, AuthError> {
    let token = session_token(headers).ok_or(AuthError::Unauthenticated)?;
    let claims = codec.verify(&token).map_err(|_| AuthError::InvalidSession)?;

    if claims.sub.is_empty() && claims.email.is_empty() {
        return Err(AuthError::InvalidSession);
    }

    let mut user = None;
    if !claims.sub.is_empty() {
        user = store.find_by_id(&claims.sub).await?;
    }
    if user.is_none() && !claims.email.is_empty() {
        user = store.find_by_email(&claims.email).await?;
    }

    user.ok_or(AuthError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::test_util::memory::MemoryUserStore;

    fn codec() -> SessionCodec {
        SessionCodec::new("test-session-secret", Duration::days(7))
    }

    fn headers_with_cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("{}={}", SESSION_COOKIE, token).parse().unwrap(),
        );
        headers
    }

    async fn store_with_user() -> (MemoryUserStore, User) {
        let store = MemoryUserStore::new();
        let user = store
            .upsert_login("user@example.com", "User", None)
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_no_cookie_is_unauthenticated() {
        let (store, _) = store_with_user().await;
        let result = authenticate(&HeaderMap::new(), &codec(), &store).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_unverifiable_token_is_invalid_session() {
        let (store, _) = store_with_user().await;
        let headers = headers_with_cookie("not-a-token");
        let result = authenticate(&headers, &codec(), &store).await;
        assert!(matches!(result, Err(AuthError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_user() {
        let (store, user) = store_with_user().await;
        let token = codec().issue(&user.id, &user.email).unwrap();

        let resolved = authenticate(&headers_with_cookie(&token), &codec(), &store)
            .await
            .expect("user should resolve");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_missing_record_is_user_not_found() {
        let (store, user) = store_with_user().await;
        let token = codec().issue(&user.id, &user.email).unwrap();
        store.remove_by_email(&user.email).await;

        let result = authenticate(&headers_with_cookie(&token), &codec(), &store).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_email_fallback_when_id_misses() {
        let (store, user) = store_with_user().await;
        // Token whose sub matches nothing but whose email does
        let token = codec().issue("stale-id", &user.email).unwrap();

        let resolved = authenticate(&headers_with_cookie(&token), &codec(), &store)
            .await
            .expect("email fallback should resolve");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_cookie_among_others_is_found() {
        let (store, user) = store_with_user().await;
        let token = codec().issue(&user.id, &user.email).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; {}={}; lang=en", SESSION_COOKIE, token)
                .parse()
                .unwrap(),
        );

        let resolved = authenticate(&headers, &codec(), &store).await.unwrap();
        assert_eq!(resolved.email, user.email);
    }
}
