use sqlx::SqlitePool;
use uuid::Uuid;

/// モブ図鑑リポジトリ
///
/// mob_id は 0..=255 の小さな整数
#[derive(Clone)]
pub struct MobCollectionRepository {
    pool: SqlitePool,
}

impl MobCollectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 所持モブIDを追加（冪等、既存行の kills は変更しない）
    pub async fn add_many(&self, account_id: Uuid, mob_ids: &[u8]) -> Result<(), sqlx::Error> {
        if mob_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for &mob_id in mob_ids {
            sqlx::query(
                r#"
                INSERT INTO mob_kills (account_id, mob_id, kills)
                VALUES (?, ?, 0)
                ON CONFLICT(account_id, mob_id) DO NOTHING
                "#,
            )
            .bind(account_id)
            .bind(i64::from(mob_id))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// 討伐を記録（未登録なら登録、登録済みなら kills を加算）
    pub async fn record_kill(&self, account_id: Uuid, mob_id: u8) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO mob_kills (account_id, mob_id, kills)
            VALUES (?, ?, 1)
            ON CONFLICT(account_id, mob_id) DO UPDATE SET kills = kills + 1
            "#,
        )
        .bind(account_id)
        .bind(i64::from(mob_id))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 所持モブID一覧（昇順）
    pub async fn list(&self, account_id: Uuid) -> Result<Vec<u8>, sqlx::Error> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT mob_id
            FROM mob_kills
            WHERE account_id = ?
            ORDER BY mob_id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids
            .into_iter()
            .filter_map(|id| u8::try_from(id).ok())
            .collect())
    }

    /// 討伐数（未登録なら None）
    pub async fn kills(&self, account_id: Uuid, mob_id: u8) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT kills
            FROM mob_kills
            WHERE account_id = ? AND mob_id = ?
            "#,
        )
        .bind(account_id)
        .bind(i64::from(mob_id))
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, IN_MEMORY};
    use crate::repositories::AccountRepository;

    async fn setup() -> (MobCollectionRepository, Uuid) {
        let pool = db::connect(IN_MEMORY).await.unwrap();
        let account = AccountRepository::new(pool.clone()).create().await.unwrap();
        (MobCollectionRepository::new(pool), account.id)
    }

    #[tokio::test]
    async fn test_add_many_is_idempotent() {
        let (repo, account_id) = setup().await;

        repo.add_many(account_id, &[7, 3, 7]).await.unwrap();
        repo.add_many(account_id, &[3]).await.unwrap();
        repo.add_many(account_id, &[]).await.unwrap();

        assert_eq!(repo.list(account_id).await.unwrap(), vec![3, 7]);
    }

    #[tokio::test]
    async fn test_record_kill_increments() {
        let (repo, account_id) = setup().await;

        assert_eq!(repo.kills(account_id, 12).await.unwrap(), None);
        repo.record_kill(account_id, 12).await.unwrap();
        repo.record_kill(account_id, 12).await.unwrap();
        assert_eq!(repo.kills(account_id, 12).await.unwrap(), Some(2));

        // 追加済みのモブは kills を保持
        repo.add_many(account_id, &[12]).await.unwrap();
        assert_eq!(repo.kills(account_id, 12).await.unwrap(), Some(2));
        assert_eq!(repo.list(account_id).await.unwrap(), vec![12]);
    }

    #[tokio::test]
    async fn test_collections_are_per_account() {
        let (repo, account_id) = setup().await;

        repo.add_many(account_id, &[1]).await.unwrap();
        assert!(repo.list(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
