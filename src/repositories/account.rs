use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::db::unix_now;
use crate::models::{Account, LeaderboardRow};
use crate::repositories::external_identity::insert_link;

/// リーダーボード取得件数の既定値
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 50;
/// リーダーボード取得件数の上限
pub const MAX_LEADERBOARD_LIMIT: i64 = 200;

#[derive(Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// アカウントIDでアカウントを検索
    pub async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, created_at, updated_at, banned, ban_reason, account_xp
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 外部IDに紐付くアカウントを検索
    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.created_at, a.updated_at, a.banned, a.ban_reason, a.account_xp
            FROM accounts a
            JOIN external_identity_links l ON l.account_id = a.id
            WHERE l.external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 新しいアカウントを作成（ランダムな UUID v4、XP 0、BAN なし）
    pub async fn create(&self) -> Result<Account, sqlx::Error> {
        insert_account(&self.pool, Uuid::new_v4(), unix_now()).await
    }

    /// アカウント作成と外部ID紐付けを 1 トランザクションで実行
    ///
    /// # Errors
    /// - UNIQUE制約違反時: 同じ外部IDが既に紐付け済み（並行ログインの競合）。
    ///   トランザクションはロールバックされ、アカウントは残らない
    pub async fn create_linked(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Account, sqlx::Error> {
        let now = unix_now();
        let mut tx = self.pool.begin().await?;

        let account = insert_account(&mut *tx, Uuid::new_v4(), now).await?;
        insert_link(&mut *tx, account.id, provider, external_id, now).await?;

        tx.commit().await?;
        Ok(account)
    }

    /// updated_at を現在時刻に更新
    pub async fn touch(&self, account_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(unix_now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// BAN 済みかどうか
    ///
    /// アカウントが存在しない場合は false
    pub async fn is_banned(&self, account_id: Uuid) -> Result<bool, sqlx::Error> {
        let banned: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT banned
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(banned.unwrap_or(false))
    }

    /// BAN 状態を更新（モデレーション操作）
    pub async fn set_banned(
        &self,
        account_id: Uuid,
        banned: bool,
        reason: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET banned = ?, ban_reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(banned)
        .bind(reason)
        .bind(unix_now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 経験値を加算
    ///
    /// # Note
    /// 経験値は単調非減少。0 以下の加算は無視する
    pub async fn add_xp(&self, account_id: Uuid, delta: i64) -> Result<(), sqlx::Error> {
        if delta <= 0 {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE accounts
            SET account_xp = account_xp + ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(delta)
        .bind(unix_now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 経験値上位のアカウントを取得
    ///
    /// 経験値 0 のアカウントは除外。同値は格納順（rowid）で並ぶ。
    /// `limit` は [1, 200] に丸める
    pub async fn top_by_xp(&self, limit: i64) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_LIMIT);

        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT a.account_xp AS xp, l.external_id AS external_id, d.username AS username
            FROM accounts a
            LEFT JOIN external_identity_links l ON l.account_id = a.id
            LEFT JOIN display_names d ON d.external_id = l.external_id
            WHERE a.account_xp > 0
            ORDER BY a.account_xp DESC, a.rowid ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// 経験値が正のアカウント数
    pub async fn count_with_positive_xp(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM accounts
            WHERE account_xp > 0
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }
}

/// アカウント行を挿入（プール・トランザクション共通）
async fn insert_account<'e>(
    executor: impl SqliteExecutor<'e>,
    account_id: Uuid,
    now: i64,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, created_at, updated_at)
        VALUES (?, ?, ?)
        RETURNING id, created_at, updated_at, banned, ban_reason, account_xp
        "#,
    )
    .bind(account_id)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}
