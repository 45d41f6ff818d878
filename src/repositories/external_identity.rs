use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::db::unix_now;
use crate::models::ExternalIdentityLink;

#[derive(Clone)]
pub struct ExternalIdentityRepository {
    pool: SqlitePool,
}

impl ExternalIdentityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 外部IDで紐付けを検索
    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalIdentityLink>, sqlx::Error> {
        sqlx::query_as::<_, ExternalIdentityLink>(
            r#"
            SELECT account_id, provider, external_id, created_at
            FROM external_identity_links
            WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// アカウントIDで紐付けを検索
    ///
    /// # Note
    /// 現状プロバイダは 1 つのため、最初の紐付けのみ返す
    pub async fn find_by_account_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<ExternalIdentityLink>, sqlx::Error> {
        sqlx::query_as::<_, ExternalIdentityLink>(
            r#"
            SELECT account_id, provider, external_id, created_at
            FROM external_identity_links
            WHERE account_id = ?
            ORDER BY rowid
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 既存アカウントに外部IDを紐付け
    ///
    /// # Errors
    /// - UNIQUE制約違反時: 外部IDが既に別アカウントへ紐付け済み、
    ///   またはアカウントが同一プロバイダの紐付けを既に持つ
    pub async fn create(
        &self,
        account_id: Uuid,
        provider: &str,
        external_id: &str,
    ) -> Result<ExternalIdentityLink, sqlx::Error> {
        insert_link(&self.pool, account_id, provider, external_id, unix_now()).await
    }
}

/// 紐付け行を挿入（プール・トランザクション共通）
pub(crate) async fn insert_link<'e>(
    executor: impl SqliteExecutor<'e>,
    account_id: Uuid,
    provider: &str,
    external_id: &str,
    now: i64,
) -> Result<ExternalIdentityLink, sqlx::Error> {
    sqlx::query_as::<_, ExternalIdentityLink>(
        r#"
        INSERT INTO external_identity_links (account_id, provider, external_id, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING account_id, provider, external_id, created_at
        "#,
    )
    .bind(account_id)
    .bind(provider)
    .bind(external_id)
    .bind(now)
    .fetch_one(executor)
    .await
}
