use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

/// Discord OAuth URLs
const DISCORD_AUTH_URL: &str = "https://discord.com/api/oauth2/authorize";
const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const DISCORD_USERINFO_URL: &str = "https://discord.com/api/users/@me";

/// プロバイダ名（URL パス `/auth/{provider}/...` と紐付けテーブルに使用）
pub const DISCORD_PROVIDER: &str = "discord";

/// OAuth トークンレスポンス
///
/// access_token の欠落は呼び出し側で BadRequest として扱う
#[derive(Debug, Clone, Default)]
pub struct OAuthTokenResponse {
    pub access_token: Option<String>,
}

/// 外部プロバイダのユーザー情報
#[derive(Debug, Clone, Default)]
pub struct ExternalProfile {
    pub id: Option<String>,
    pub username: Option<String>,
}

/// 外部 OAuth アイデンティティプロバイダ
///
/// トークン交換とプロフィール取得の 2 回の呼び出しのみを扱うブラックボックス。
/// タイムアウト・リトライは持たない（認可コードは使い捨てのため）。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// プロバイダ名
    fn name(&self) -> &str;

    /// 認可 URL を生成
    fn authorize_url(&self) -> Result<String, AppError>;

    /// 認可コードをアクセストークンに交換
    async fn exchange_code(&self, code: &str) -> Result<OAuthTokenResponse, AppError>;

    /// アクセストークンでユーザー情報を取得
    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AppError>;
}

/// Discord トークンエンドポイントからのレスポンス
#[derive(Debug, Deserialize)]
struct DiscordTokenResponse {
    access_token: Option<String>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// Discord users/@me エンドポイントからのレスポンス
#[derive(Debug, Deserialize)]
struct DiscordUserResponse {
    id: Option<serde_json::Value>,
    username: Option<String>,
}

/// Discord OAuth サービス
///
/// # Security
/// - client_secret はログに出力しない
/// - access_token はログに出力しない
#[derive(Clone)]
pub struct DiscordOAuthService {
    client_id: String,
    /// クライアントシークレット（機密情報 - ログ出力禁止）
    client_secret: Arc<String>,
    redirect_uri: String,
    http_client: reqwest::Client,
}

impl DiscordOAuthService {
    /// 新しい DiscordOAuthService を作成
    ///
    /// # Arguments
    /// * `client_id` - Discord OAuth クライアントID
    /// * `client_secret` - Discord OAuth クライアントシークレット（機密情報）
    /// * `redirect_uri` - OAuth コールバック URI
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret: Arc::new(client_secret),
            redirect_uri,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for DiscordOAuthService {
    fn name(&self) -> &str {
        DISCORD_PROVIDER
    }

    /// Discord OAuth 認可 URL を生成（scope は identify のみ）
    fn authorize_url(&self) -> Result<String, AppError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "identify"),
        ];

        let url = reqwest::Url::parse_with_params(DISCORD_AUTH_URL, &params).map_err(|e| {
            tracing::error!(error = ?e, "OAuth認可URL生成エラー");
            AppError::Internal(anyhow::anyhow!("failed to generate auth url"))
        })?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokenResponse, AppError> {
        // application/x-www-form-urlencoded 形式で body を構築
        let body = format!(
            "client_id={}&client_secret={}&grant_type=authorization_code&code={}&redirect_uri={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(self.client_secret.as_str()),
            urlencoding::encode(code),
            urlencoding::encode(&self.redirect_uri),
        );

        let response = self
            .http_client
            .post(DISCORD_TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Discordトークンエンドポイント通信エラー");
                AppError::Upstream("token endpoint unreachable".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "Discordトークン交換エラー");
            return Err(AppError::Upstream(format!(
                "token exchange failed: {}",
                status
            )));
        }

        let token_response: DiscordTokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Discordトークンレスポンスのパースエラー");
            AppError::Upstream("invalid token response".to_string())
        })?;

        Ok(OAuthTokenResponse {
            access_token: token_response.access_token,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AppError> {
        let response = self
            .http_client
            .get(DISCORD_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Discord users/@me 通信エラー");
                AppError::Upstream("userinfo endpoint unreachable".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "Discordユーザー情報取得エラー");
            return Err(AppError::Upstream(format!(
                "userinfo request failed: {}",
                status
            )));
        }

        let user: DiscordUserResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Discordユーザー情報レスポンスのパースエラー");
            AppError::Upstream("invalid userinfo response".to_string())
        })?;

        Ok(ExternalProfile {
            id: user.id.as_ref().and_then(external_id_from_json),
            username: user.username.filter(|name| !name.is_empty()),
        })
    }
}

/// JSON の id を外部ID文字列に変換
///
/// Discord は snowflake を文字列で返すが、数値でも受け付ける
fn external_id_from_json(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_service() -> DiscordOAuthService {
        DiscordOAuthService::new(
            "test-client-id".to_string(),
            "test-client-secret".to_string(),
            "http://localhost:3000/auth/discord/callback".to_string(),
        )
    }

    #[test]
    fn test_authorize_url() {
        let service = create_test_service();

        let url = service.authorize_url().unwrap();

        assert!(url.starts_with(DISCORD_AUTH_URL));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=identify"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fdiscord%2Fcallback"
        ));
        // シークレットは URL に含めない
        assert!(!url.contains("test-client-secret"));
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(create_test_service().name(), "discord");
    }

    #[test]
    fn test_external_id_from_json() {
        assert_eq!(
            external_id_from_json(&json!("80351110224678912")),
            Some("80351110224678912".to_string())
        );
        assert_eq!(external_id_from_json(&json!(42)), Some("42".to_string()));
        assert_eq!(external_id_from_json(&json!("")), None);
        assert_eq!(external_id_from_json(&json!(null)), None);
        assert_eq!(external_id_from_json(&json!({"id": 1})), None);
    }

    #[test]
    fn test_token_response_without_access_token() {
        let parsed: DiscordTokenResponse =
            serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(parsed.access_token.is_none());
    }
}
