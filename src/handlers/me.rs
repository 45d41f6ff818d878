use axum::{Json, extract::State};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::CurrentAccount;
use crate::state::AppState;

/// 自アカウントのプロフィール
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub account_id: Uuid,
    /// 紐付いた外部ID（未紐付けなら空文字）
    pub discord_id: String,
    /// キャッシュ済み表示名（なければ空文字）
    pub username: String,
    pub account_xp: i64,
    pub account_level: u32,
    #[serde(rename = "xpNeeded")]
    pub xp_needed: u64,
}

/// 自アカウント情報ハンドラー
///
/// GET /auth/me
///
/// - セッションなし・無効: 401
/// - BAN 済み: 403
pub async fn me(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<ProfileResponse>, AppError> {
    let external_id = state
        .identity_repo
        .find_by_account_id(account.id)
        .await?
        .map(|link| link.external_id);

    // 表示名はキャッシュのみ参照（プロバイダへの同期問い合わせはしない）
    let username = match &external_id {
        Some(id) => state.display_name_repo.find(id).await?,
        None => None,
    };

    let info = state.level_curve.level_of(account.account_xp);

    Ok(Json(ProfileResponse {
        account_id: account.id,
        discord_id: external_id.unwrap_or_default(),
        username: username.unwrap_or_default(),
        account_xp: account.account_xp,
        account_level: info.level,
        xp_needed: info.xp_to_next_level,
    }))
}
