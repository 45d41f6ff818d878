//! アカウント経験値 → レベル換算
//!
//! レベル `L` を通過するのに必要な経験値は `(floor(1.06^(L-1) * L) + 3) * M`。
//! ランキング順は導出レベルではなく累積経験値の降順で決まる。

use serde::Serialize;

/// レベル上限
pub const MAX_LEVEL: u32 = 99;
/// 経験値倍率の既定値
pub const DEFAULT_XP_MULTIPLIER: u32 = 100;
/// 上限レベル到達時の「次レベルまで」（実質無限）
pub const XP_NEEDED_AT_CAP: u64 = u32::MAX as u64;

/// レベル換算結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    /// 現レベル内の経験値（レベル通過後の残り）
    pub xp_into_level: u64,
    /// 次レベルに必要な経験値。上限到達時は `XP_NEEDED_AT_CAP`
    pub xp_to_next_level: u64,
}

/// 倍率 1 でのレベル通過コスト
pub fn score_to_pass_level(level: u32) -> u64 {
    let base = 1.06_f64.powi(level as i32 - 1) * f64::from(level);
    base.floor() as u64 + 3
}

/// レベル曲線
///
/// 倍率は起動時に設定から一度だけ解決し、AppState で共有する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    multiplier: u64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::new(DEFAULT_XP_MULTIPLIER)
    }
}

impl LevelCurve {
    /// 倍率 0 は既定値 100 として扱う
    pub fn new(multiplier: u32) -> Self {
        let multiplier = if multiplier == 0 {
            DEFAULT_XP_MULTIPLIER
        } else {
            multiplier
        };
        Self {
            multiplier: u64::from(multiplier),
        }
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// レベル `level` を通過するのに必要な経験値
    pub fn cost(&self, level: u32) -> u64 {
        score_to_pass_level(level).saturating_mul(self.multiplier)
    }

    /// 累積経験値をレベルに換算
    ///
    /// 負値は 0 として扱う
    pub fn level_of(&self, total_xp: i64) -> LevelInfo {
        let mut remaining = u64::try_from(total_xp).unwrap_or(0);
        let mut level = 1;

        while level < MAX_LEVEL {
            let need = self.cost(level);
            if remaining < need {
                break;
            }
            remaining -= need;
            level += 1;
        }

        let xp_to_next_level = if level >= MAX_LEVEL {
            XP_NEEDED_AT_CAP
        } else {
            self.cost(level)
        };

        LevelInfo {
            level,
            xp_into_level: remaining,
            xp_to_next_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// レベル 99 到達に必要な累積経験値
    fn xp_to_reach_cap(curve: &LevelCurve) -> i64 {
        (1..MAX_LEVEL).map(|l| curve.cost(l) as i64).sum()
    }

    #[test]
    fn test_score_to_pass_level_first_levels() {
        assert_eq!(score_to_pass_level(1), 4);
        assert_eq!(score_to_pass_level(2), 5);
        assert_eq!(score_to_pass_level(3), 6);
        assert_eq!(score_to_pass_level(10), 19);
    }

    #[test]
    fn test_zero_xp() {
        let curve = LevelCurve::default();
        assert_eq!(
            curve.level_of(0),
            LevelInfo {
                level: 1,
                xp_into_level: 0,
                xp_to_next_level: 400,
            }
        );
    }

    #[test]
    fn test_xp_within_first_level() {
        let curve = LevelCurve::default();
        assert_eq!(
            curve.level_of(102),
            LevelInfo {
                level: 1,
                xp_into_level: 102,
                xp_to_next_level: 400,
            }
        );
    }

    #[test]
    fn test_level_boundary() {
        let curve = LevelCurve::default();
        assert_eq!(curve.level_of(399).level, 1);

        let info = curve.level_of(400);
        assert_eq!(info.level, 2);
        assert_eq!(info.xp_into_level, 0);
        assert_eq!(info.xp_to_next_level, 500);
    }

    #[test]
    fn test_negative_xp_clamped() {
        let curve = LevelCurve::default();
        assert_eq!(curve.level_of(-5), curve.level_of(0));
    }

    #[test]
    fn test_cap_reports_sentinel() {
        let curve = LevelCurve::default();
        let cap = xp_to_reach_cap(&curve);

        let below = curve.level_of(cap - 1);
        assert_eq!(below.level, MAX_LEVEL - 1);
        assert_ne!(below.xp_to_next_level, XP_NEEDED_AT_CAP);

        for xp in [cap, cap + 1, cap * 10, i64::MAX] {
            let info = curve.level_of(xp);
            assert_eq!(info.level, MAX_LEVEL);
            assert_eq!(info.xp_to_next_level, XP_NEEDED_AT_CAP);
        }
        assert_eq!(curve.level_of(cap + 7).xp_into_level, 7);
    }

    #[test]
    fn test_level_monotonic_and_remainder_below_threshold() {
        let curve = LevelCurve::default();
        let cap = xp_to_reach_cap(&curve);
        let step = (cap / 5_000).max(1);

        let mut previous = 1;
        let mut xp = 0;
        while xp <= cap + step {
            let info = curve.level_of(xp);
            assert!((1..=MAX_LEVEL).contains(&info.level));
            assert!(info.level >= previous, "level decreased at xp={xp}");
            if info.level < MAX_LEVEL {
                assert!(info.xp_into_level < curve.cost(info.level));
                assert_eq!(info.xp_to_next_level, curve.cost(info.level));
            }
            previous = info.level;
            xp += step;
        }
    }

    #[test]
    fn test_multiplier() {
        assert_eq!(LevelCurve::new(0).multiplier(), 100);

        let curve = LevelCurve::new(1);
        assert_eq!(curve.level_of(4).level, 2);
        assert_eq!(curve.level_of(3).xp_to_next_level, 4);

        // 巨大な倍率でもオーバーフローしない
        let huge = LevelCurve::new(u32::MAX);
        assert_eq!(huge.level_of(i64::MAX).level, MAX_LEVEL);
    }
}
