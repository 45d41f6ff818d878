use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::extractors::CurrentAccount;
use crate::state::AppState;

/// モブ図鑑レスポンス
#[derive(Debug, Serialize)]
pub struct MobsResponse {
    pub mobs: Vec<u8>,
}

/// アカウント初期データ
///
/// GET /api/account/bootstrap
///
/// クライアント起動時に呼ばれる。現状は図鑑のみ返す。
pub async fn bootstrap(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<MobsResponse>, AppError> {
    let mobs = state.mob_repo.list(account.id).await?;
    Ok(Json(MobsResponse { mobs }))
}

/// 図鑑の取得
///
/// GET /api/account/mobs
pub async fn list_mobs(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<MobsResponse>, AppError> {
    let mobs = state.mob_repo.list(account.id).await?;
    Ok(Json(MobsResponse { mobs }))
}

/// 図鑑への追加
///
/// POST /api/account/mobs
///
/// ボディは JSON 配列、または `mobs` 配列を持つオブジェクト。
/// 範囲外・数値以外の要素や壊れたボディは無視し、認証済みなら常に 200 を返す。
pub async fn add_mobs(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let mob_ids = parse_mob_ids(&body);
    if mob_ids.is_empty() {
        return Ok("OK");
    }

    state.mob_repo.add_many(account.id, &mob_ids).await?;
    tracing::debug!(account_id = %account.id, count = mob_ids.len(), "図鑑を更新");

    Ok("OK")
}

/// リクエストボディからモブIDを抽出（0..=255 の整数のみ、重複除去）
pub fn parse_mob_ids(body: &[u8]) -> Vec<u8> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Vec::new();
    };

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("mobs") {
            Some(Value::Array(entries)) => entries,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut mob_ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(id) = entry.as_u64().and_then(|id| u8::try_from(id).ok()) else {
            continue;
        };
        if !mob_ids.contains(&id) {
            mob_ids.push(id);
        }
    }
    mob_ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        assert_eq!(parse_mob_ids(b"[1, 2, 3]"), vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_object_with_mobs() {
        assert_eq!(parse_mob_ids(br#"{"mobs": [0, 255]}"#), vec![0, 255]);
    }

    #[test]
    fn test_parse_drops_invalid_entries() {
        assert_eq!(parse_mob_ids(br#"[5, 5, 300, -1, "x", 2.5, null]"#), vec![5]);
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(parse_mob_ids(b"").is_empty());
        assert!(parse_mob_ids(b"not json").is_empty());
        assert!(parse_mob_ids(b"42").is_empty());
        assert!(parse_mob_ids(br#"{"mobs": 3}"#).is_empty());
        assert!(parse_mob_ids(br#"{"other": [1]}"#).is_empty());
    }
}
