//! OAuth ログインハンドラー
//!
//! Discord OAuth を使用したログイン処理を提供する。
//!
//! # Security
//! - access_token・セッショントークンはログに出力しない
//! - セッション Cookie は HttpOnly / Secure / SameSite=Lax

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, header::USER_AGENT},
    response::Redirect,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

use crate::error::AppError;
use crate::state::AppState;

/// OAuth 認証開始
///
/// GET /auth/{provider}/login
///
/// プロバイダの認可 URL にリダイレクトする（scope は identify のみ）
pub async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    ensure_provider(&state, &provider)?;
    tracing::info!(provider = %provider, "OAuth 認証開始");

    let auth_url = state.identity_provider.authorize_url()?;
    Ok(Redirect::to(&auth_url))
}

/// OAuth コールバック処理
///
/// GET /auth/{provider}/callback?code=...
///
/// # 処理フロー
/// 1. アカウント連携フロー（トークン交換 → ユーザー情報取得 → アカウント解決 → セッション発行）
/// 2. セッション Cookie を設定
/// 3. `/` にリダイレクト
///
/// クエリはマップとして受け取り、`code` の重複は後勝ちとする
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    ensure_provider(&state, &provider)?;
    tracing::info!(provider = %provider, "OAuth コールバック受信");

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let session = state
        .account_link_service
        .complete_login(params.get("code").map(String::as_str), user_agent)
        .await?;

    let cookie = session_cookie(
        state.config.cookie_name.clone(),
        session.id,
        state.config.session_ttl_secs,
    );

    Ok((jar.add(cookie), Redirect::to("/")))
}

/// セッション Cookie を構築
///
/// オリジン全体（Path=/）、Max-Age はセッション TTL と同じ
pub fn session_cookie(name: String, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// パスのプロバイダ名が設定済みプロバイダと一致するか確認
fn ensure_provider(state: &AppState, provider: &str) -> Result<(), AppError> {
    if provider != state.identity_provider.name() {
        tracing::warn!(provider = %provider, "未対応の OAuth プロバイダ");
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("sid".to_string(), "abc".to_string(), 28_800);

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(28_800)));
    }
}
