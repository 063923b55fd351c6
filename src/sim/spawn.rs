//! Procedural obstacle placement

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Obstacle, SimParams};
use crate::conditions::Condition;

/// Produces obstacles with a uniformly random gap position
#[derive(Debug, Clone)]
pub struct ObstacleGenerator {
    rng: Pcg32,
    seed: u64,
    width: i32,
    field_height: i32,
    top_margin: i32,
    floor_margin: i32,
    slack: i32,
}

impl ObstacleGenerator {
    /// Generator with a reproducible layout sequence
    pub fn seeded(params: &SimParams, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            seed,
            width: params.obstacle_width,
            field_height: params.field_height,
            top_margin: params.gap_top_margin,
            floor_margin: params.gap_floor_margin,
            slack: params.gap_range_slack,
        }
    }

    /// Generator seeded from OS entropy
    pub fn from_entropy(params: &SimParams) -> Self {
        Self::seeded(params, rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Inclusive range of valid gap tops for a hole size.
    ///
    /// A hole too tall for the field would leave the range empty; the upper
    /// bound is then pushed to `min + slack` so a value always exists.
    /// A negative slack counts as zero.
    pub fn gap_range(&self, hole_size: i32) -> (i32, i32) {
        let min = self.top_margin;
        let mut max = self
            .field_height
            .saturating_sub(self.floor_margin)
            .saturating_sub(hole_size);
        if max < min {
            max = min.saturating_add(self.slack.max(0));
        }
        (min, max)
    }

    /// Obstacle at `x` with the active condition's gap height
    pub fn generate(&mut self, x: i32, condition: &Condition) -> Obstacle {
        let (min, max) = self.gap_range(condition.hole_size);
        let gap_top = self.rng.random_range(min..=max);
        log::debug!("Spawned obstacle at x={} gap_top={}", x, gap_top);

        Obstacle {
            x,
            gap_top,
            width: self.width,
            gap_height: condition.hole_size,
            passed: false,
        }
    }
}
