//! XP to level mapping on the triangular curve.
//!
//! Level `L` spans `[triangular(L - 1), triangular(L))` where
//! `triangular(n) = 50 * n * (n + 1)`, so reaching level `L + 1` costs
//! `100 * L` XP on top of level `L`.

use serde::{Deserialize, Serialize};

const XP_PER_LEVEL_STEP: u64 = 100;

/// Cumulative XP required to leave level `n`, saturating at `u64::MAX`.
pub fn triangular(n: u32) -> u64 {
    checked_triangular(n).unwrap_or(u64::MAX)
}

/// Cumulative XP required to leave level `n`, or `None` past `u64::MAX`.
pub fn checked_triangular(n: u32) -> Option<u64> {
    let n = u64::from(n);
    (XP_PER_LEVEL_STEP / 2)
        .checked_mul(n)?
        .checked_mul(n + 1)
}

/// Level for a cumulative XP total. Always `>= 1`, total over `u64`.
///
/// Uses the inverse of the triangular curve and corrects the float estimate
/// on integer boundaries. A threshold beyond `u64::MAX` is never reached.
pub fn level_for_xp(xp: u64) -> u32 {
    // Largest n with 50 * n * (n + 1) <= xp, level = n + 1.
    let estimate = ((1.0 + 0.08 * xp as f64).sqrt() - 1.0) / 2.0;
    let mut completed = estimate.max(0.0).floor() as u32;
    while completed > 0 && checked_triangular(completed).map_or(true, |floor| floor > xp) {
        completed -= 1;
    }
    while checked_triangular(completed + 1).is_some_and(|next| next <= xp) {
        completed += 1;
    }
    completed + 1
}

/// Position of an XP total inside a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// XP earned since entering the level.
    pub earned: u64,
    /// XP span of the level (`100 * level`).
    pub needed_for_next: u64,
    /// `round(100 * earned / needed_for_next)`, clamped to `0..=100`.
    pub percent: u8,
}

/// Progress of `xp` inside `level`.
///
/// A `level` of 0 is treated as 1. XP below the level floor reports zero
/// progress.
pub fn progress_within_level(xp: u64, level: u32) -> LevelProgress {
    let level = level.max(1);
    let needed_for_next = XP_PER_LEVEL_STEP * u64::from(level);
    let earned = xp.saturating_sub(triangular(level - 1));
    let (earned_wide, needed_wide) = (u128::from(earned), u128::from(needed_for_next));
    let rounded = (earned_wide * 200 + needed_wide) / (2 * needed_wide);
    LevelProgress {
        earned,
        needed_for_next,
        percent: rounded.min(100) as u8,
    }
}
