//! アカウント連携フロー
//!
//! 1 回のログイン試行の状態遷移:
//! `Start → CodeReceived → TokenExchanged → IdentityFetched → AccountResolved → SessionMinted`
//!
//! 途中で失敗した場合の部分状態（アカウント作成済み・セッション未発行など）は許容する。
//! 外部IDごとに紐付けは冪等なため、次回ログインで自然に解消される。

use std::sync::Arc;

use time::Duration;

use crate::error::{AUTH_FAILED, AppError, MISSING_CODE, USER_FETCH_FAILED};
use crate::models::{Account, Session};
use crate::repositories::{AccountRepository, DisplayNameRepository, is_unique_violation};
use crate::services::SessionService;
use crate::services::oauth::IdentityProvider;

/// アカウント連携サービス
#[derive(Clone)]
pub struct AccountLinkService {
    provider: Arc<dyn IdentityProvider>,
    account_repo: AccountRepository,
    display_name_repo: DisplayNameRepository,
    session_service: SessionService,
    session_ttl: Duration,
}

impl AccountLinkService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        account_repo: AccountRepository,
        display_name_repo: DisplayNameRepository,
        session_service: SessionService,
        session_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            account_repo,
            display_name_repo,
            session_service,
            session_ttl,
        }
    }

    /// OAuth コールバックを処理し、セッションを発行
    ///
    /// # 処理フロー
    /// 1. code の存在確認
    /// 2. code でトークン交換
    /// 3. access_token でユーザー情報取得
    /// 4. 外部IDでアカウントを検索または作成
    /// 5. 表示名キャッシュを更新（失敗しても続行）
    /// 6. セッション発行
    ///
    /// # Security
    /// - access_token・セッショントークンはログに出力しない
    pub async fn complete_login(
        &self,
        code: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<Session, AppError> {
        // 1. code の存在確認
        let code = code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or(AppError::BadRequest(MISSING_CODE))?;

        // 2. code でトークン交換（プロバイダ側の失敗は一律 BadRequest）
        let token_response = self.provider.exchange_code(code).await.map_err(|e| {
            tracing::warn!(error = %e, provider = %self.provider.name(), "トークン交換失敗");
            AppError::BadRequest(AUTH_FAILED)
        })?;
        let access_token = token_response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AppError::BadRequest(AUTH_FAILED))?;
        tracing::debug!("トークン交換成功");

        // 3. access_token でユーザー情報取得
        let profile = self
            .provider
            .fetch_profile(&access_token)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, provider = %self.provider.name(), "ユーザー情報取得失敗");
                AppError::BadRequest(USER_FETCH_FAILED)
            })?;
        let external_id = profile
            .id
            .filter(|id| !id.is_empty())
            .ok_or(AppError::BadRequest(USER_FETCH_FAILED))?;

        // 4. アカウント解決
        let account = self.resolve_account(&external_id).await?;

        // 5. 表示名キャッシュ（結果整合のため失敗は致命的でない）
        if let Some(username) = profile.username.as_deref()
            && let Err(e) = self.display_name_repo.upsert(&external_id, username).await
        {
            tracing::warn!(error = ?e, account_id = %account.id, "表示名キャッシュ更新失敗");
        }

        // 6. セッション発行
        let session = self
            .session_service
            .mint(account.id, self.session_ttl, user_agent)
            .await?;

        tracing::info!(
            provider = %self.provider.name(),
            account_id = %account.id,
            "OAuth ログイン成功"
        );

        Ok(session)
    }

    /// 外部IDに紐付くアカウントを検索、なければ作成
    ///
    /// 検索と作成の間は競合しうる（check-then-act）。競合はロックで防がず、
    /// 外部IDの UNIQUE 制約違反として検出し、敗者側は再検索して勝者のアカウントを使う。
    pub async fn resolve_account(&self, external_id: &str) -> Result<Account, AppError> {
        if let Some(account) = self.account_repo.find_by_external_id(external_id).await? {
            self.account_repo.touch(account.id).await?;
            tracing::info!(account_id = %account.id, "既存アカウントでログイン");
            return Ok(account);
        }

        match self.create_linked_account(external_id).await {
            Ok(account) => {
                tracing::info!(
                    provider = %self.provider.name(),
                    account_id = %account.id,
                    "新規アカウントを作成"
                );
                Ok(account)
            }
            Err(AppError::Conflict) => {
                tracing::info!("アカウント作成が競合 - 再検索");
                let account = self
                    .account_repo
                    .find_by_external_id(external_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "link conflict but no linked account found"
                        ))
                    })?;
                self.account_repo.touch(account.id).await?;
                Ok(account)
            }
            Err(e) => Err(e),
        }
    }

    /// アカウント作成 + 紐付け（UNIQUE 制約違反は Conflict）
    async fn create_linked_account(&self, external_id: &str) -> Result<Account, AppError> {
        self.account_repo
            .create_linked(self.provider.name(), external_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict
                } else {
                    AppError::Database(e)
                }
            })
    }
}
