//! Collision detection between the avatar, the field bounds and obstacles
//!
//! The avatar is treated as an axis-aligned square of half-size `radius`
//! around its center, with the vertical center truncated to whole pixels.
//! Any contact is fatal; there is no damage model.

use serde::{Deserialize, Serialize};

use super::state::{Avatar, Obstacle, SimParams};

/// Why a trial ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Crossed the top edge
    Ceiling,
    /// Touched the ground line
    Ground,
    /// Touched an obstacle's barrier (index into the obstacle list)
    Obstacle { index: usize },
}

/// Top edge or ground line contact
pub fn avatar_bounds_collision(avatar: &Avatar, params: &SimParams) -> Option<Termination> {
    let cy = avatar.y as i32;
    if cy - avatar.radius <= 0 {
        Some(Termination::Ceiling)
    } else if cy + avatar.radius >= params.ground_y() {
        Some(Termination::Ground)
    } else {
        None
    }
}

/// True if the avatar overlaps the obstacle horizontally and is not fully inside its gap
pub fn avatar_obstacle_collision(avatar: &Avatar, obstacle: &Obstacle) -> bool {
    let cx = avatar.x;
    let cy = avatar.y as i32;
    let r = avatar.radius;

    let overlaps_x = cx + r > obstacle.x && cx - r < obstacle.right();
    if !overlaps_x {
        return false;
    }
    cy - r < obstacle.gap_top || cy + r > obstacle.gap_bottom()
}

/// First violation found, bounds before obstacles, obstacles in sequence order
pub fn check(avatar: &Avatar, obstacles: &[Obstacle], params: &SimParams) -> Option<Termination> {
    avatar_bounds_collision(avatar, params).or_else(|| {
        obstacles
            .iter()
            .position(|o| avatar_obstacle_collision(avatar, o))
            .map(|index| Termination::Obstacle { index })
    })
}
