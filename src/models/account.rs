use sqlx::FromRow;
use uuid::Uuid;

/// ゲームアカウント
///
/// 外部ID（OAuthプロバイダのユーザーID）とは独立した永続ID。
/// 初回ログイン時に一度だけ作成され、通常運用では削除されない。
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
    pub banned: bool,
    pub ban_reason: Option<String>,
    pub account_xp: i64,
}

/// リーダーボードの 1 行（経験値降順）
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub xp: i64,
    pub external_id: Option<String>,
    pub username: Option<String>,
}
