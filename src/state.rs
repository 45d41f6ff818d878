use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use time::Duration;

use crate::config::Config;
use crate::repositories::{
    AccountRepository, DisplayNameRepository, ExternalIdentityRepository, MobCollectionRepository,
    SessionRepository,
};
use crate::services::oauth::DISCORD_PROVIDER;
use crate::services::{
    AccountLinkService, DiscordOAuthService, IdentityProvider, LeaderboardService, LevelCurve,
    SessionService,
};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// レベル曲線（倍率は起動時に一度だけ解決）
    pub level_curve: LevelCurve,
    /// 外部ID紐付けリポジトリ
    pub identity_repo: ExternalIdentityRepository,
    /// 表示名キャッシュリポジトリ
    pub display_name_repo: DisplayNameRepository,
    /// モブ図鑑リポジトリ
    pub mob_repo: MobCollectionRepository,
    /// セッションサービス
    pub session_service: SessionService,
    /// アカウント連携サービス
    pub account_link_service: AccountLinkService,
    /// リーダーボードサービス
    pub leaderboard_service: LeaderboardService,
    /// OAuth プロバイダ
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// 新しい AppState を作成（Discord OAuth を使用）
    ///
    /// プールは呼び出し側が所有し、シャットダウン時に閉じる
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        let provider = DiscordOAuthService::new(
            config.discord_client_id.clone(),
            config.discord_client_secret.expose_secret().clone(),
            config.callback_uri(DISCORD_PROVIDER),
        );
        tracing::info!("Discord OAuth サービスを初期化");

        Self::with_provider(db_pool, config, Arc::new(provider))
    }

    /// 任意の OAuth プロバイダで AppState を作成
    pub fn with_provider(
        db_pool: SqlitePool,
        config: Config,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let config = Arc::new(config);
        let level_curve = LevelCurve::new(config.account_xp_mult);

        let account_repo = AccountRepository::new(db_pool.clone());
        let identity_repo = ExternalIdentityRepository::new(db_pool.clone());
        let display_name_repo = DisplayNameRepository::new(db_pool.clone());
        let mob_repo = MobCollectionRepository::new(db_pool.clone());
        let session_repo = SessionRepository::new(db_pool);

        let session_service = SessionService::new(session_repo, account_repo.clone());
        let account_link_service = AccountLinkService::new(
            identity_provider.clone(),
            account_repo.clone(),
            display_name_repo.clone(),
            session_service.clone(),
            Duration::seconds(config.session_ttl_secs),
        );
        let leaderboard_service = LeaderboardService::new(account_repo, level_curve);

        Self {
            config,
            level_curve,
            identity_repo,
            display_name_repo,
            mob_repo,
            session_service,
            account_link_service,
            leaderboard_service,
            identity_provider,
        }
    }
}
