use serde::{Deserialize, Serialize};

use crate::*;

/// Constants of the outcome score. The defaults reproduce the shipped game balance.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreTuning {
    pub points_per_match: u32,
    /// Par time granted per card on the board, in seconds.
    pub par_seconds_per_card: u32,
    pub min_speed: f64,
    pub max_speed: f64,
    pub floor: u32,
}

impl ScoreTuning {
    pub const DEFAULT: Self = Self {
        points_per_match: 100,
        par_seconds_per_card: 2,
        min_speed: 0.35,
        max_speed: 1.5,
        floor: 100,
    };

    /// Score of a won game, rewarding few moves and fast play.
    pub fn score(&self, moves: u32, total_matches: u32, elapsed_secs: u64, group: GroupSize) -> u32 {
        if total_matches == 0 {
            return self.floor;
        }
        let par_time = total_matches as f64 * group.get() as f64 * self.par_seconds_per_card as f64;
        let speed = par_time / elapsed_secs.max(1) as f64;
        let speed_factor = speed.clamp(self.min_speed, self.max_speed);
        self.finish(self.base(total_matches) * efficiency(moves, total_matches) * speed_factor)
    }

    /// Score that ignores play time.
    pub fn simple_score(&self, moves: u32, total_matches: u32) -> u32 {
        if total_matches == 0 {
            return self.floor;
        }
        self.finish(self.base(total_matches) * efficiency(moves, total_matches))
    }

    fn base(&self, total_matches: u32) -> f64 {
        total_matches as f64 * self.points_per_match as f64
    }

    fn finish(&self, raw: f64) -> u32 {
        (raw.round() as u32).max(self.floor)
    }
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Share of reveal rounds that found a group. A won game needs at least one round per group.
fn efficiency(moves: u32, total_matches: u32) -> f64 {
    total_matches as f64 / moves.max(total_matches) as f64
}

pub fn score(moves: u32, total_matches: u32, elapsed_secs: u64, group: GroupSize) -> u32 {
    ScoreTuning::DEFAULT.score(moves, total_matches, elapsed_secs, group)
}

pub fn simple_score(moves: u32, total_matches: u32) -> u32 {
    ScoreTuning::DEFAULT.simple_score(moves, total_matches)
}
