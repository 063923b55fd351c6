//! Semantic actions and on-screen control regions
//!
//! The presentation layer draws whatever `controls` returns and forwards
//! clicks by position; it never needs to know what a button means.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::experiment::Phase;

/// Button geometry
pub const BUTTON_WIDTH: i32 = 140;
pub const BUTTON_HEIGHT: i32 = 40;
/// Distance from the bottom edge to the first button slot
pub const BUTTON_BASE_OFFSET: i32 = 260;
/// Vertical distance between button slots
pub const BUTTON_SPACING: i32 = 55;

/// Discrete actions a participant or operator can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Start a trial with the current condition
    Start,
    /// Move to the next condition and start a trial ("Try Again")
    Advance,
    /// Hand the rig to the next participant
    NewParticipant,
    Exit,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Start => "Start",
            Action::Advance => "Try Again",
            Action::NewParticipant => "New Game",
            Action::Exit => "Exit",
        }
    }

    /// Vertical slot index in the button column
    fn slot(&self) -> i32 {
        match self {
            Action::Start => 0,
            Action::Advance => 1,
            Action::NewParticipant => 2,
            Action::Exit => 3,
        }
    }
}

/// Axis-aligned rectangle in field pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Half-open containment, like a pixel grid
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x as f32
            && p.x < (self.x + self.width) as f32
            && p.y >= self.y as f32
            && p.y < (self.y + self.height) as f32
    }
}

/// A clickable region bound to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Control {
    pub action: Action,
    pub label: &'static str,
    pub rect: Rect,
}

/// Screen rectangle of an action's button in a field of the given size
pub fn button_rect(action: Action, field_width: i32, field_height: i32) -> Rect {
    Rect {
        x: field_width / 2 - BUTTON_WIDTH / 2,
        y: field_height - BUTTON_BASE_OFFSET + action.slot() * BUTTON_SPACING,
        width: BUTTON_WIDTH,
        height: BUTTON_HEIGHT,
    }
}

/// Actions offered in each phase
pub fn actions_for(phase: Phase) -> &'static [Action] {
    match phase {
        Phase::Menu => &[Action::Start, Action::NewParticipant, Action::Exit],
        Phase::GameOver => &[Action::Advance, Action::NewParticipant, Action::Exit],
        Phase::Running | Phase::Exited => &[],
    }
}

/// Visible controls for a phase
pub fn controls(phase: Phase, field_width: i32, field_height: i32) -> Vec<Control> {
    actions_for(phase)
        .iter()
        .map(|&action| Control {
            action,
            label: action.label(),
            rect: button_rect(action, field_width, field_height),
        })
        .collect()
}

/// Action under a pointer position, if any control is hit
pub fn hit_test(phase: Phase, field_width: i32, field_height: i32, p: Vec2) -> Option<Action> {
    controls(phase, field_width, field_height)
        .into_iter()
        .find(|c| c.rect.contains(p))
        .map(|c| c.action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_layout() {
        assert_eq!(
            button_rect(Action::Start, 400, 700),
            Rect { x: 130, y: 440, width: 140, height: 40 }
        );
        assert_eq!(button_rect(Action::Advance, 400, 700).y, 495);
        assert_eq!(button_rect(Action::NewParticipant, 400, 700).y, 550);
        assert_eq!(button_rect(Action::Exit, 400, 700).y, 605);
    }

    #[test]
    fn test_controls_per_phase() {
        let menu: Vec<_> = controls(Phase::Menu, 400, 700).iter().map(|c| c.action).collect();
        assert_eq!(menu, vec![Action::Start, Action::NewParticipant, Action::Exit]);

        let over: Vec<_> = controls(Phase::GameOver, 400, 700).iter().map(|c| c.action).collect();
        assert_eq!(over, vec![Action::Advance, Action::NewParticipant, Action::Exit]);

        assert!(controls(Phase::Running, 400, 700).is_empty());
        assert!(controls(Phase::Exited, 400, 700).is_empty());
    }

    #[test]
    fn test_hit_test() {
        let inside_start = Vec2::new(200.0, 460.0);
        let inside_advance_slot = Vec2::new(200.0, 500.0);
        let gap_between = Vec2::new(200.0, 485.0);

        assert_eq!(hit_test(Phase::Menu, 400, 700, inside_start), Some(Action::Start));
        // Advance is not offered from the menu
        assert_eq!(hit_test(Phase::Menu, 400, 700, inside_advance_slot), None);
        assert_eq!(
            hit_test(Phase::GameOver, 400, 700, inside_advance_slot),
            Some(Action::Advance)
        );
        assert_eq!(hit_test(Phase::GameOver, 400, 700, gap_between), None);
        assert_eq!(hit_test(Phase::Running, 400, 700, inside_start), None);
    }

    #[test]
    fn test_rect_edges() {
        let rect = Rect { x: 10, y: 10, width: 5, height: 5 };
        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(rect.contains(Vec2::new(14.9, 14.9)));
        assert!(!rect.contains(Vec2::new(15.0, 12.0)));
        assert!(!rect.contains(Vec2::new(9.9, 12.0)));
    }
}
