use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::models::Account;
use crate::state::AppState;

/// セッション Cookie のトークンを取り出す
///
/// Cookie がなければ `None`（DB は参照しない）
pub fn session_token(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// 認証済みアカウント
///
/// セッション Cookie を検証し、所有アカウントを解決する。
/// - Cookie なし・無効なセッション: 401
/// - BAN 済み: 403
pub struct CurrentAccount(pub Account);

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token =
            session_token(&jar, &state.config.cookie_name).ok_or(AppError::Unauthorized)?;

        let account = state.session_service.validate(&token).await?;
        Ok(Self(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    fn jar(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_session_token_found() {
        let jar = jar("theme=dark; sid=abc123");
        assert_eq!(session_token(&jar, "sid").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        assert!(session_token(&jar("theme=dark"), "sid").is_none());
        assert!(session_token(&jar("sid="), "sid").is_none());
        assert!(session_token(&CookieJar::new(), "sid").is_none());
    }
}
