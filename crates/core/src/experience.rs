//! Experience and level arithmetic.
//!
//! Every level costs a flat 100 exp. Finishing a course while eligible pays
//! the full reward; an ineligible learner still gets a participation grant.

/// Exp granted when an eligible learner completes a course.
pub const COURSE_EXP_REWARD: u32 = 100;

/// Exp granted on completion when the learner is not exp-eligible.
pub const PARTICIPATION_EXP: u32 = 15;

/// Exp needed to advance one level.
pub const EXP_PER_LEVEL: u32 = 100;

/// A user's level and progress toward the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: u32,
    /// Percent of the way to the next level, capped at 100.
    pub progress_percent: u32,
}

/// Derives level and in-level progress from total exp.
///
/// Levels start at 1; a user levels up each time their total crosses
/// `level * EXP_PER_LEVEL`.
#[must_use]
pub fn level_for_exp(exp: u32) -> LevelInfo {
    let mut level: u32 = 1;
    while u64::from(exp) >= u64::from(level) * u64::from(EXP_PER_LEVEL) {
        level += 1;
    }
    let into_level = exp - (level - 1) * EXP_PER_LEVEL;
    LevelInfo {
        level,
        progress_percent: (into_level * 100 / EXP_PER_LEVEL).min(100),
    }
}

/// The exp grant for a completed course given the enrollment's eligibility.
#[must_use]
pub fn completion_reward(exp_eligible: bool) -> u32 {
    if exp_eligible {
        COURSE_EXP_REWARD
    } else {
        PARTICIPATION_EXP
    }
}
