use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;

use crate::error::AppError;
use crate::services::leaderboard::{LeaderboardEntry, parse_limit};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LeaderboardCountResponse {
    pub total: i64,
}

/// リーダーボード
///
/// GET /auth/leaderboard?limit=N（別名 /api/leaderboard）
///
/// 認証不要。経験値 0 のアカウントは含まない。
/// クエリは寛容に解釈する（`limit` の重複は後勝ち、不正値は既定値）。
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let limit = parse_limit(params.get("limit").map(String::as_str));
    let entries = state.leaderboard_service.top(limit).await?;
    Ok(Json(entries))
}

/// 経験値が正のアカウント数
///
/// GET /auth/leaderboard/count（別名 /api/leaderboard/count）
pub async fn leaderboard_count(
    State(state): State<AppState>,
) -> Result<Json<LeaderboardCountResponse>, AppError> {
    let total = state.leaderboard_service.count().await?;
    Ok(Json(LeaderboardCountResponse { total }))
}
