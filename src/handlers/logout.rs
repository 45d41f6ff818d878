use axum::extract::State;
use axum_extra::extract::{CookieJar, cookie::Cookie};

use crate::error::AppError;
use crate::extractors::session_token;
use crate::state::AppState;

/// ログアウトハンドラー
///
/// POST /auth/logout
///
/// 提示されたセッションを失効させ、Cookie を削除する。
/// セッションがなくても成功を返す（冪等）。
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, &'static str), AppError> {
    let cookie_name = state.config.cookie_name.clone();

    if let Some(token) = session_token(&jar, &cookie_name) {
        state.session_service.revoke(&token).await?;
    }

    let jar = jar.remove(Cookie::build(cookie_name).path("/"));
    Ok((jar, "OK"))
}
