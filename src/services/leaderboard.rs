use serde::Serialize;

use crate::error::AppError;
use crate::repositories::AccountRepository;
use crate::repositories::account::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT};
use crate::services::level::LevelCurve;

/// 表示名も外部IDもない場合の名前
const UNNAMED: &str = "Unnamed";

/// リーダーボードの表示行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub level: u32,
    /// 現レベル内の経験値
    pub xp: u64,
    #[serde(rename = "xpNeeded")]
    pub xp_needed: u64,
}

/// クエリの limit を解釈
///
/// 先頭の数字列だけを読む（`"10abc"` は 10）。
/// 数値でない・0 以下・未指定は既定値 50、上限は 200（桁あふれも 200）
pub fn parse_limit(raw: Option<&str>) -> i64 {
    let Some(value) = raw.map(str::trim) else {
        return DEFAULT_LEADERBOARD_LIMIT;
    };

    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let digits = &rest[..digits_len];

    if negative || digits.is_empty() {
        return DEFAULT_LEADERBOARD_LIMIT;
    }

    match digits.parse::<i64>() {
        Ok(0) => DEFAULT_LEADERBOARD_LIMIT,
        Ok(limit) => limit.min(MAX_LEADERBOARD_LIMIT),
        // 数字のみで i64 をあふれる場合は正の巨大値
        Err(_) => MAX_LEADERBOARD_LIMIT,
    }
}

/// リーダーボードサービス（公開・認証不要）
#[derive(Clone)]
pub struct LeaderboardService {
    account_repo: AccountRepository,
    level_curve: LevelCurve,
}

impl LeaderboardService {
    pub fn new(account_repo: AccountRepository, level_curve: LevelCurve) -> Self {
        Self {
            account_repo,
            level_curve,
        }
    }

    /// 経験値上位を取得し、表示用に換算
    ///
    /// 並び順は累積経験値の降順（レベルではない）
    pub async fn top(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = self.account_repo.top_by_xp(limit).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let info = self.level_curve.level_of(row.xp);
                let name = row
                    .username
                    .filter(|name| !name.is_empty())
                    .or(row.external_id)
                    .unwrap_or_else(|| UNNAMED.to_string());
                LeaderboardEntry {
                    name,
                    level: info.level,
                    xp: info.xp_into_level,
                    xp_needed: info.xp_to_next_level,
                }
            })
            .collect())
    }

    /// 経験値が正のアカウント数
    pub async fn count(&self) -> Result<i64, AppError> {
        Ok(self.account_repo.count_with_positive_xp().await?)
    }
}
