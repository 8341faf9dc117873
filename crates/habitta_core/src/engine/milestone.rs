//! Streak milestones and encouragement tiers.

use serde::{Deserialize, Serialize};

/// Streak lengths that earn a milestone bonus, ascending.
pub const STREAK_MILESTONES: [u32; 6] = [7, 14, 30, 60, 100, 365];

/// Bonus attached to a reached milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReward {
    pub milestone: u32,
    pub xp: u32,
    pub reward_points: u32,
    /// `true` only on the exact day the milestone is reached.
    pub is_new: bool,
}

const MILESTONE_REWARDS: [(u32, u32, u32); 6] = [
    (7, 50, 10),
    (14, 100, 25),
    (30, 250, 50),
    (60, 500, 100),
    (100, 1_000, 200),
    (365, 5_000, 1_000),
];

/// Highest milestone reached by `streak`, if any.
pub fn milestone_reward(streak: u32) -> Option<MilestoneReward> {
    MILESTONE_REWARDS
        .iter()
        .rev()
        .find(|(milestone, _, _)| streak >= *milestone)
        .map(|&(milestone, xp, reward_points)| MilestoneReward {
            milestone,
            xp,
            reward_points,
            is_new: streak == milestone,
        })
}

/// Days left until the next milestone; `None` past the last one.
pub fn days_to_next_milestone(streak: u32) -> Option<u32> {
    STREAK_MILESTONES
        .iter()
        .find(|milestone| streak < **milestone)
        .map(|milestone| milestone - streak)
}

pub fn streak_message(streak: u32) -> &'static str {
    match streak {
        0 => "Start your streak today!",
        1..=6 => "Great start! Keep building your streak!",
        7..=13 => "You're on fire! One week strong!",
        14..=29 => "Amazing dedication! Two weeks strong!",
        30..=59 => "Incredible! A whole month!",
        60..=99 => "Legendary! Over 60 days!",
        _ => "UNSTOPPABLE! You're a habit master!",
    }
}
