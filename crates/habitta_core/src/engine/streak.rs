//! Streak evaluation over completion days.
//!
//! # Responsibility
//! - Derive current/longest streak from a set of completion days.
//! - Advance and expire the history-less user streak counter.
//!
//! # Invariants
//! - `longest >= current` for every evaluation.
//! - A streak is current only when its last day is `as_of` or `as_of - 1`.
//! - Staleness clears the current streak, never the longest.
//! - Days after `as_of` are not visible to an evaluation.

use crate::model::day::{day_diff, CalendarDay};
use std::collections::BTreeSet;

/// Result of one streak evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

/// Evaluates current and longest streak for `history` as seen on `as_of`.
///
/// `history` may be unordered and contain duplicates.
pub fn evaluate_streak<I>(history: I, as_of: CalendarDay) -> StreakSummary
where
    I: IntoIterator<Item = CalendarDay>,
{
    let days: BTreeSet<CalendarDay> = history.into_iter().filter(|day| *day <= as_of).collect();
    let Some(&most_recent) = days.last() else {
        return StreakSummary::default();
    };

    let current = if most_recent == as_of || most_recent == as_of.pred() {
        let mut run = 1u32;
        let mut cursor = most_recent;
        for &day in days.iter().rev().skip(1) {
            if day_diff(cursor, day) != 1 {
                break;
            }
            run += 1;
            cursor = day;
        }
        run
    } else {
        0
    };

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<CalendarDay> = None;
    for &day in &days {
        run = match previous {
            Some(prev) if day_diff(day, prev) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    StreakSummary { current, longest }
}

/// Advances a counter-style streak for activity on `as_of`.
///
/// - no prior activity: 1
/// - same day: unchanged, at least 1
/// - next day: +1
/// - gap of two or more days: restarts at 1
/// - `as_of` before `last_active`: unchanged
pub fn advance_streak(streak: u32, last_active: Option<CalendarDay>, as_of: CalendarDay) -> u32 {
    let Some(last) = last_active else {
        return 1;
    };
    match day_diff(as_of, last) {
        0 => streak.max(1),
        1 => streak.saturating_add(1),
        diff if diff > 1 => 1,
        _ => streak,
    }
}

/// Clears a counter-style streak when more than one day passed without
/// activity.
pub fn expire_streak(streak: u32, last_active: Option<CalendarDay>, as_of: CalendarDay) -> u32 {
    match last_active {
        Some(last) if day_diff(as_of, last) > 1 => 0,
        _ => streak,
    }
}
