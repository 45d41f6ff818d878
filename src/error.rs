use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// 呼び出し元へ返す短い本文（内部情報は含めない）
pub const MISSING_CODE: &str = "Missing code";
pub const AUTH_FAILED: &str = "Auth failed";
pub const USER_FETCH_FAILED: &str = "User fetch failed";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 入力不足・不正（code / access_token / 外部ID の欠落など）
    #[error("不正なリクエスト: {0}")]
    BadRequest(&'static str),

    /// セッションなし・無効・期限切れ
    #[error("未認証")]
    Unauthorized,

    /// 有効なセッションだがアカウントが BAN 済み
    #[error("アカウント停止中")]
    Forbidden,

    #[error("存在しないリソース")]
    NotFound,

    /// 外部ID紐付けの UNIQUE 制約違反（並行ログイン競合）
    ///
    /// 通常は連携フロー内で再検索により解消され、外には出ない
    #[error("外部IDは既に紐付け済みです")]
    Conflict,

    /// OAuth プロバイダとの通信失敗・不正な応答
    #[error("OAuthプロバイダーエラー: {0}")]
    Upstream(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, *message),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Banned"),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            Self::Conflict => {
                tracing::error!("外部ID紐付けの競合が解消されずに伝播");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
            Self::Upstream(e) => {
                tracing::warn!(error = %e, "OAuthプロバイダーエラー");
                (StatusCode::BAD_REQUEST, AUTH_FAILED)
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (StatusCode::INTERNAL_SERVER_ERROR, "DB error")
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        (status, message).into_response()
    }
}
