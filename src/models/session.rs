use sqlx::FromRow;
use uuid::Uuid;

/// セッション（Bearer クレデンシャル）
///
/// id がそのまま Cookie に載るトークン。保持者は有効期限までアカウントの権限を持つ。
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub account_id: Uuid,
    pub created_at: i64,
    pub expires_at: i64,
    pub revoked: bool,
    pub user_agent_hash: Option<String>,
}

impl Session {
    /// `now`（UNIX秒）時点で有効か
    ///
    /// 失効していない かつ `now < expires_at` の場合のみ有効
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.revoked && now < self.expires_at
    }
}
