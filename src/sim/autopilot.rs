//! Scripted jump policy for unattended runs of the rig

use super::state::{SimParams, TrialRun};

/// Fraction of the gap height, measured up from the gap bottom, the policy aims to stay above
const TARGET_FRACTION: f32 = 0.2;

/// Whether a scripted player would jump this tick.
///
/// Aims for a line inside the next uncleared gap and jumps whenever the
/// avatar has sunk below it while not already rising.
pub fn wants_jump(run: &TrialRun, params: &SimParams) -> bool {
    let avatar = &run.avatar;
    if avatar.velocity < 0.0 {
        return false;
    }

    let target_y = run
        .obstacles
        .iter()
        .find(|o| o.right() >= avatar.x - avatar.radius)
        .map(|o| o.gap_bottom() as f32 - o.gap_height as f32 * TARGET_FRACTION)
        .unwrap_or(params.field_height as f32 / 2.0);

    avatar.y > target_y
}
