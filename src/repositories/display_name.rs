use sqlx::SqlitePool;

use crate::db::unix_now;

/// 表示名キャッシュ（外部ID → ユーザー名）
///
/// ログイン時にのみ更新される結果整合のキャッシュ。権威データではない。
#[derive(Clone)]
pub struct DisplayNameRepository {
    pool: SqlitePool,
}

impl DisplayNameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 表示名を登録または更新
    pub async fn upsert(&self, external_id: &str, username: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO display_names (external_id, username, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE
            SET username = excluded.username, updated_at = excluded.updated_at
            "#,
        )
        .bind(external_id)
        .bind(username)
        .bind(unix_now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 外部IDで表示名を検索
    pub async fn find(&self, external_id: &str) -> Result<Option<String>, sqlx::Error> {
        let username: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT username
            FROM display_names
            WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(username.flatten())
    }
}
