use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::Session;

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 新しいセッションを作成
    ///
    /// # Arguments
    /// * `token` - セッショントークン（主キー）
    /// * `account_id` - 所有アカウント
    /// * `created_at` / `expires_at` - UNIX秒
    /// * `user_agent_hash` - User-Agent の SHA256（任意）
    pub async fn create(
        &self,
        token: &str,
        account_id: Uuid,
        created_at: i64,
        expires_at: i64,
        user_agent_hash: Option<&str>,
    ) -> Result<Session, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, account_id, created_at, expires_at, revoked, user_agent_hash)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING id, account_id, created_at, expires_at, revoked, user_agent_hash
            "#,
        )
        .bind(token)
        .bind(account_id)
        .bind(created_at)
        .bind(expires_at)
        .bind(user_agent_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// トークンでセッションを検索
    ///
    /// # Note
    /// 有効期限や失効フラグの検証は呼び出し側で行う
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, account_id, created_at, expires_at, revoked, user_agent_hash
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    /// セッションを失効
    ///
    /// # Returns
    /// 該当セッションが存在したか（既に失効済みでも true）
    pub async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked = 1
            WHERE id = ?
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
