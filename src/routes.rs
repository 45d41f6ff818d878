use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Router の構築
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/health", get(handlers::health_check))
        // OAuth ログイン
        .route("/auth/{provider}/login", get(handlers::oauth_login))
        .route("/auth/{provider}/callback", get(handlers::oauth_callback))
        // セッション
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        // リーダーボード（公開）
        .route("/auth/leaderboard", get(handlers::leaderboard))
        .route("/auth/leaderboard/count", get(handlers::leaderboard_count))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/leaderboard/count", get(handlers::leaderboard_count))
        // アカウントデータ
        .route("/api/account/bootstrap", get(handlers::bootstrap))
        .route(
            "/api/account/mobs",
            get(handlers::list_mobs).post(handlers::add_mobs),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
