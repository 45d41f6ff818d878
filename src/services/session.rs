use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use time::Duration;
use uuid::Uuid;

use crate::db::unix_now;
use crate::error::AppError;
use crate::models::{Account, Session};
use crate::repositories::{AccountRepository, SessionRepository};

/// セッショントークンのバイト長（256bit、hex で 64 文字）
const TOKEN_BYTES: usize = 32;
/// DB 参照前に弾くトークン長の範囲
const MIN_TOKEN_LEN: usize = 32;
const MAX_TOKEN_LEN: usize = 128;

/// セッションサービス
///
/// トークンは署名なしの不透明な Bearer クレデンシャル。
/// 検証は毎回 DB 参照となる代わりに、失効が即時に反映される。
///
/// # Security
/// - トークン平文はログに出力しない
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    account_repo: AccountRepository,
}

impl SessionService {
    pub fn new(session_repo: SessionRepository, account_repo: AccountRepository) -> Self {
        Self {
            session_repo,
            account_repo,
        }
    }

    /// セッションを発行
    ///
    /// # Arguments
    /// * `account_id` - 所有アカウント
    /// * `ttl` - 有効期間（`expires_at = now + ttl`）
    /// * `user_agent` - ログイン時の User-Agent（ハッシュのみ保存）
    pub async fn mint(
        &self,
        account_id: Uuid,
        ttl: Duration,
        user_agent: Option<&str>,
    ) -> Result<Session, AppError> {
        let token = generate_token();
        let now = unix_now();
        let expires_at = now.saturating_add(ttl.whole_seconds());
        let user_agent_hash = user_agent.map(hash_user_agent);

        let session = self
            .session_repo
            .create(
                &token,
                account_id,
                now,
                expires_at,
                user_agent_hash.as_deref(),
            )
            .await?;

        tracing::info!(account_id = %account_id, expires_at, "セッション発行");

        Ok(session)
    }

    /// セッションを検証し、所有アカウントを返す
    ///
    /// # Errors
    /// - `Unauthorized`: 不存在・失効済み・期限切れ
    /// - `Forbidden`: アカウントが BAN 済み
    pub async fn validate(&self, token: &str) -> Result<Account, AppError> {
        self.validate_at(token, unix_now()).await
    }

    /// `now`（UNIX秒）時点でセッションを検証
    pub async fn validate_at(&self, token: &str, now: i64) -> Result<Account, AppError> {
        // 明らかに不正な長さは DB を参照せずに拒否
        if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&token.len()) {
            return Err(AppError::Unauthorized);
        }

        let session = self
            .session_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !session.is_valid_at(now) {
            tracing::debug!(
                account_id = %session.account_id,
                revoked = session.revoked,
                "無効なセッション"
            );
            return Err(AppError::Unauthorized);
        }

        let account = self
            .account_repo
            .find_by_id(session.account_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if account.banned {
            tracing::warn!(account_id = %account.id, "BAN 済みアカウントのアクセス");
            return Err(AppError::Forbidden);
        }

        Ok(account)
    }

    /// セッションを失効（冪等）
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        if self.session_repo.revoke(token).await? {
            tracing::info!("セッション失効");
        }
        Ok(())
    }
}

/// 256bit の暗号論的乱数トークンを hex で生成
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// User-Agent を SHA256 でハッシュ化
fn hash_user_agent(user_agent: &str) -> String {
    hex::encode(Sha256::digest(user_agent.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, IN_MEMORY};

    async fn setup() -> (SessionService, AccountRepository, SessionRepository) {
        let pool = db::connect(IN_MEMORY).await.unwrap();
        let account_repo = AccountRepository::new(pool.clone());
        let session_repo = SessionRepository::new(pool);
        let service = SessionService::new(session_repo.clone(), account_repo.clone());
        (service, account_repo, session_repo)
    }

    #[test]
    fn test_generate_token_format() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_user_agent() {
        let hash = hash_user_agent("Mozilla/5.0");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_user_agent("Mozilla/5.0"));
        assert_ne!(hash, hash_user_agent("curl/8.0"));
    }

    #[tokio::test]
    async fn test_mint_and_validate() {
        let (service, accounts, sessions) = setup().await;
        let account = accounts.create().await.unwrap();

        let session = service
            .mint(account.id, Duration::hours(8), Some("Mozilla/5.0"))
            .await
            .unwrap();
        assert_eq!(session.expires_at - session.created_at, 8 * 3600);
        assert!(!session.revoked);

        let stored = sessions.find_by_token(&session.id).await.unwrap().unwrap();
        assert_eq!(
            stored.user_agent_hash.as_deref(),
            Some(hash_user_agent("Mozilla/5.0").as_str())
        );

        let resolved = service.validate(&session.id).await.unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_account() {
        let (service, accounts, _) = setup().await;
        let account = accounts.create().await.unwrap();

        let first = service.mint(account.id, Duration::hours(1), None).await.unwrap();
        let second = service.mint(account.id, Duration::hours(1), None).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(service.validate(&first.id).await.is_ok());
        assert!(service.validate(&second.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthorized() {
        let (service, accounts, _) = setup().await;
        let account = accounts.create().await.unwrap();
        let session = service.mint(account.id, Duration::hours(1), None).await.unwrap();

        let before = service.validate_at(&session.id, session.expires_at - 1).await;
        assert!(before.is_ok());

        let at_expiry = service.validate_at(&session.id, session.expires_at).await;
        assert!(matches!(at_expiry, Err(AppError::Unauthorized)));

        // TTL 0 は発行直後から無効
        let zero = service.mint(account.id, Duration::ZERO, None).await.unwrap();
        assert!(matches!(
            service.validate_at(&zero.id, zero.created_at).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_revoked_session_is_unauthorized() {
        let (service, accounts, _) = setup().await;
        let account = accounts.create().await.unwrap();
        let session = service.mint(account.id, Duration::hours(1), None).await.unwrap();

        service.revoke(&session.id).await.unwrap();
        // 冪等
        service.revoke(&session.id).await.unwrap();

        assert!(matches!(
            service.validate(&session.id).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_banned_account_is_forbidden() {
        let (service, accounts, _) = setup().await;
        let account = accounts.create().await.unwrap();
        let session = service.mint(account.id, Duration::hours(1), None).await.unwrap();

        accounts.set_banned(account.id, true, None).await.unwrap();

        assert!(matches!(
            service.validate(&session.id).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_token_is_unauthorized() {
        let (service, _, _) = setup().await;

        let unknown = "f".repeat(64);
        let too_long = "f".repeat(200);

        for token in ["", "short", unknown.as_str(), too_long.as_str()] {
            assert!(matches!(
                service.validate(token).await,
                Err(AppError::Unauthorized)
            ));
        }
    }

    #[tokio::test]
    async fn test_malformed_token_rejected_without_store_read() {
        let pool = db::connect(IN_MEMORY).await.unwrap();
        let service = SessionService::new(
            SessionRepository::new(pool.clone()),
            AccountRepository::new(pool.clone()),
        );
        // 閉じたプールに触れると Database エラーになる
        pool.close().await;

        let too_short = "f".repeat(31);
        let too_long = "f".repeat(129);
        for token in ["", "short", too_short.as_str(), too_long.as_str()] {
            assert!(matches!(
                service.validate(token).await,
                Err(AppError::Unauthorized)
            ));
        }

        // 長さが妥当なら参照が走る
        assert!(matches!(
            service.validate(&"f".repeat(64)).await,
            Err(AppError::Database(_))
        ));
    }
}
