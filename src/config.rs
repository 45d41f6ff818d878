use std::path::Path;

use secrecy::SecretBox;
use serde::Deserialize;

/// 設定ファイルパスを指定する環境変数
pub const CONFIG_PATH_ENV: &str = "PETALGATE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "auth.config.json";
/// 設定ファイルの有無にかかわらず参照する経験値倍率の環境変数
pub const ACCOUNT_XP_MULT_ENV: &str = "ACCOUNT_XP_MULT";

/// アプリケーション設定
///
/// 大文字キー（`DISCORD_CLIENT_ID`, `DB_PATH`, `COOKIE_TTL_MS` など）の
/// 既存 `auth.config.json` もそのまま読める
#[derive(Debug, Deserialize)]
pub struct Config {
    // Discord OAuth 設定
    #[serde(alias = "DISCORD_CLIENT_ID")]
    pub discord_client_id: String,
    /// クライアントシークレット（機密情報 - ログ出力禁止）
    #[serde(alias = "DISCORD_CLIENT_SECRET")]
    pub discord_client_secret: SecretBox<String>,
    /// 公開ベースURL（コールバック URI の組み立てに使用）
    #[serde(default = "default_site_base_url", alias = "SITE_BASE_URL")]
    pub site_base_url: String,

    /// SQLite ファイルパス
    #[serde(default = "default_database_path", alias = "DB_PATH", alias = "db_path")]
    pub database_path: String,

    // セッション Cookie 設定
    #[serde(default = "default_cookie_name", alias = "COOKIE_NAME")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
    /// ミリ秒指定の TTL。指定があれば session_ttl_secs を上書きする
    #[serde(default, alias = "COOKIE_TTL_MS")]
    cookie_ttl_ms: Option<i64>,

    /// アカウントレベル曲線の経験値倍率
    #[serde(default = "default_account_xp_mult", alias = "ACCOUNT_XP_MULT")]
    pub account_xp_mult: u32,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("設定ファイルの読み込みに失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("設定ファイルのパースに失敗: {0}")]
    Json(#[from] serde_json::Error),

    #[error("環境変数の読み込みに失敗: {0}")]
    Env(#[from] envy::Error),

    #[error("設定値が不正: {0}")]
    Invalid(&'static str),
}

const DEFAULT_SITE_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_DATABASE_PATH: &str = "data.db";
const DEFAULT_COOKIE_NAME: &str = "sid";
const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 8;
const DEFAULT_ACCOUNT_XP_MULT: u32 = 100;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

fn default_site_base_url() -> String {
    DEFAULT_SITE_BASE_URL.to_string()
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_session_ttl_secs() -> i64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_account_xp_mult() -> u32 {
    DEFAULT_ACCOUNT_XP_MULT
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Config {
    /// 設定を読み込む
    ///
    /// `PETALGATE_CONFIG`（既定 `auth.config.json`）が存在すれば JSON ファイルから、
    /// 存在しなければ環境変数から読み込む。未指定項目は既定値。
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let config = if Path::new(&path).exists() {
            tracing::info!(path = %path, "設定ファイルを読み込み");
            let raw = std::fs::read_to_string(&path)?;
            let mut config = Self::from_json(&raw)?;
            config.apply_xp_mult_override(std::env::var(ACCOUNT_XP_MULT_ENV).ok().as_deref());
            config
        } else {
            let config: Self = envy::from_env()?;
            config.normalize().validated()?
        };

        Ok(config)
    }

    /// JSON 文字列から設定を構築
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.normalize().validated()
    }

    /// 環境変数の経験値倍率で上書き（数値でなければ無視）
    pub fn apply_xp_mult_override(&mut self, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };
        match raw.trim().parse::<u32>() {
            Ok(mult) => self.account_xp_mult = mult,
            Err(e) => {
                tracing::warn!(error = %e, value = %raw, "ACCOUNT_XP_MULT が不正なため無視");
            }
        }
    }

    /// ミリ秒指定の TTL を秒に換算
    fn normalize(mut self) -> Self {
        if let Some(ms) = self.cookie_ttl_ms.take() {
            self.session_ttl_secs = ms / 1000;
        }
        self
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.discord_client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("discord_client_id は必須です"));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("cookie_name は空にできません"));
        }
        if self.session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_secs は正の値である必要があります",
            ));
        }
        Ok(())
    }

    /// OAuth コールバック URI
    pub fn callback_uri(&self, provider: &str) -> String {
        format!(
            "{}/auth/{}/callback",
            self.site_base_url.trim_end_matches('/'),
            provider
        )
    }
}
