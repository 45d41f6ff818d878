/// ヘルスチェックハンドラー
///
/// GET /auth/health
///
/// 認証不要。ロードバランサーやモニタリングツールから呼び出される。
pub async fn health_check() -> &'static str {
    "OK"
}
