//! Simulation state types
//!
//! A `TrialRun` only exists while a trial is running; it is created by the
//! experiment when a trial starts and dropped once it produces a survival time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::spawn::ObstacleGenerator;
use crate::conditions::Condition;
use crate::consts::*;

/// Field geometry and physics tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub field_width: i32,
    pub field_height: i32,
    pub ground_margin: i32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub scroll_speed: i32,
    pub avatar_x: i32,
    pub avatar_radius: i32,
    pub obstacle_width: i32,
    pub gap_top_margin: i32,
    pub gap_floor_margin: i32,
    pub gap_range_slack: i32,
    pub initial_obstacles: usize,
    pub first_obstacle_offset: i32,
    pub respawn_offset: i32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            ground_margin: GROUND_MARGIN,
            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            scroll_speed: SCROLL_SPEED,
            avatar_x: AVATAR_X,
            avatar_radius: AVATAR_RADIUS,
            obstacle_width: OBSTACLE_WIDTH,
            gap_top_margin: GAP_TOP_MARGIN,
            gap_floor_margin: GAP_FLOOR_MARGIN,
            gap_range_slack: GAP_RANGE_SLACK,
            initial_obstacles: INITIAL_OBSTACLES,
            first_obstacle_offset: FIRST_OBSTACLE_OFFSET,
            respawn_offset: RESPAWN_OFFSET,
        }
    }
}

impl SimParams {
    /// Y coordinate of the ground line
    pub fn ground_y(&self) -> i32 {
        self.field_height - self.ground_margin
    }
}

/// The player's avatar. Horizontal position is fixed; only y moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub x: i32,
    pub y: f32,
    /// Positive is downward
    pub velocity: f32,
    pub radius: i32,
}

impl Avatar {
    pub fn new(params: &SimParams) -> Self {
        Self {
            x: params.avatar_x,
            y: params.field_height as f32 / 2.0,
            velocity: 0.0,
            radius: params.avatar_radius,
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y)
    }

    /// Replace the current velocity with an upward impulse
    pub fn jump(&mut self, jump_power: f32) {
        self.velocity = -jump_power;
    }
}

/// A top/bottom barrier pair with a passable gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge
    pub x: i32,
    /// Bottom of the upper barrier
    pub gap_top: i32,
    pub width: i32,
    pub gap_height: i32,
    /// Already counted toward the score
    pub passed: bool,
}

impl Obstacle {
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Top of the lower barrier
    pub fn gap_bottom(&self) -> i32 {
        self.gap_top + self.gap_height
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }
}

/// Transient state of one running trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRun {
    pub avatar: Avatar,
    /// Sorted by ascending `x`
    pub obstacles: Vec<Obstacle>,
    pub score: u32,
    /// Clock reading (ms) when the trial started
    pub start_ms: u64,
    /// Ticks advanced so far
    pub ticks: u64,
}

impl TrialRun {
    /// Fresh run with obstacles pre-placed beyond the right edge
    pub fn new(
        params: &SimParams,
        condition: &Condition,
        generator: &mut ObstacleGenerator,
        start_ms: u64,
    ) -> Self {
        let first_x = params.field_width + params.first_obstacle_offset;
        let obstacles = (0..params.initial_obstacles)
            .map(|i| {
                let offset = (i as i32).saturating_mul(condition.pipe_distance);
                generator.generate(first_x.saturating_add(offset), condition)
            })
            .collect();

        Self {
            avatar: Avatar::new(params),
            obstacles,
            score: 0,
            start_ms,
            ticks: 0,
        }
    }

    /// Milliseconds elapsed since the trial started
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    pub fn is_sorted(&self) -> bool {
        self.obstacles.windows(2).all(|w| w[0].x <= w[1].x)
    }
}
