use sqlx::FromRow;
use uuid::Uuid;

/// 外部IDとアカウントの紐付け
///
/// external_id は全紐付けで一意（1つの外部IDが複数アカウントに紐付くことはない）
#[derive(Debug, Clone, FromRow)]
pub struct ExternalIdentityLink {
    pub account_id: Uuid,
    pub provider: String,
    pub external_id: String,
    pub created_at: i64,
}
