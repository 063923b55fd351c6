//! Fixed timestep simulation tick
//!
//! Advances a running trial by exactly one step. Each call does a bounded
//! amount of work and never blocks.

use super::collision::{self, Termination};
use super::spawn::ObstacleGenerator;
use super::state::{SimParams, TrialRun};
use crate::conditions::Condition;

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Terminate(Termination),
}

/// Advance the trial by one fixed step.
///
/// Order: gravity, integration, obstacle scroll/cull/spawn, collision, scoring.
pub fn tick(
    run: &mut TrialRun,
    condition: &Condition,
    generator: &mut ObstacleGenerator,
    params: &SimParams,
) -> TickOutcome {
    run.ticks += 1;

    // Gravity, clamped to terminal velocity
    let avatar = &mut run.avatar;
    avatar.velocity = (avatar.velocity + params.gravity).min(params.max_fall_speed);
    avatar.y += avatar.velocity;

    update_obstacles(run, condition, generator, params);

    // A terminating tick still scores obstacles it passed
    let termination = collision::check(&run.avatar, &run.obstacles, params);
    run.score += update_score(run);

    match termination {
        Some(termination) => TickOutcome::Terminate(termination),
        None => TickOutcome::Continue,
    }
}

/// Scroll obstacles left, drop the ones past the left edge, append a new one
/// when the rightmost has scrolled far enough in.
pub fn update_obstacles(
    run: &mut TrialRun,
    condition: &Condition,
    generator: &mut ObstacleGenerator,
    params: &SimParams,
) {
    for obstacle in &mut run.obstacles {
        obstacle.x -= params.scroll_speed;
    }

    // The list is sorted, so everything off-screen sits at the front
    let gone = run.obstacles.iter().take_while(|o| o.right() < 0).count();
    run.obstacles.drain(..gone);

    let spawn_x = match run.obstacles.last() {
        Some(last) if last.right() + condition.pipe_distance < params.field_width => {
            Some(last.x + condition.pipe_distance)
        }
        Some(_) => None,
        None => Some(params.field_width + params.respawn_offset),
    };
    if let Some(x) = spawn_x {
        run.obstacles.push(generator.generate(x, condition));
    }
}

/// Mark obstacles whose center the avatar has passed; returns the number newly passed
fn update_score(run: &mut TrialRun) -> u32 {
    let avatar_x = run.avatar.x;
    let mut newly_passed = 0;
    for obstacle in run.obstacles.iter_mut().filter(|o| !o.passed) {
        if avatar_x > obstacle.center_x() {
            obstacle.passed = true;
            newly_passed += 1;
        }
    }
    newly_passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::conditions;
    use crate::sim::state::Obstacle;
    use proptest::prelude::*;

    fn setup(seed: u64) -> (SimParams, Condition, ObstacleGenerator, TrialRun) {
        let params = SimParams::default();
        let condition = conditions()[0].clone();
        let mut generator = ObstacleGenerator::seeded(&params, seed);
        let run = TrialRun::new(&params, &condition, &mut generator, 0);
        (params, condition, generator, run)
    }

    /// Obstacle whose gap always contains the avatar
    fn open_obstacle(x: i32) -> Obstacle {
        Obstacle {
            x,
            gap_top: 15,
            width: 70,
            gap_height: 620,
            passed: false,
        }
    }

    #[test]
    fn test_velocity_reaches_terminal_speed() {
        let (mut params, condition, mut generator, mut run) = setup(1);
        // Tall field so the avatar does not hit the ground within 40 ticks
        params.field_height = 100_000;
        run.obstacles.clear();

        for _ in 0..40 {
            let outcome = tick(&mut run, &condition, &mut generator, &params);
            assert_eq!(outcome, TickOutcome::Continue);
            run.obstacles.clear();
        }
        assert_eq!(run.avatar.velocity, 15.0);
    }

    #[test]
    fn test_first_tick_applies_gravity_then_integrates() {
        let (params, condition, mut generator, mut run) = setup(1);
        tick(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.avatar.velocity, 0.5);
        assert_eq!(run.avatar.y, 350.5);
        assert_eq!(run.ticks, 1);
    }

    #[test]
    fn test_obstacles_scroll_left() {
        let (params, condition, mut generator, mut run) = setup(1);
        let before: Vec<_> = run.obstacles.iter().map(|o| o.x).collect();
        tick(&mut run, &condition, &mut generator, &params);
        let after: Vec<_> = run.obstacles.iter().map(|o| o.x).collect();
        assert_eq!(after, before.iter().map(|x| x - 3).collect::<Vec<_>>());
    }

    #[test]
    fn test_leftmost_removed_once_trailing_edge_exits() {
        let (params, condition, mut generator, mut run) = setup(1);
        // Trailing edge lands exactly on the boundary: kept
        run.obstacles = vec![open_obstacle(-67), open_obstacle(300)];
        update_obstacles(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles.len(), 2);
        assert_eq!(run.obstacles[0].x, -70);
        assert_eq!(run.obstacles[0].right(), 0);

        // One step later it is past the boundary
        update_obstacles(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles.len(), 1);
        assert_eq!(run.obstacles[0].x, 294);
    }

    #[test]
    fn test_all_stale_obstacles_removed() {
        let (params, condition, mut generator, mut run) = setup(1);
        run.obstacles = vec![open_obstacle(-500), open_obstacle(-300), open_obstacle(300)];
        update_obstacles(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles.len(), 1);
        assert_eq!(run.obstacles[0].x, 297);
    }

    #[test]
    fn test_spawn_exactly_when_spacing_would_close() {
        let (params, condition, mut generator, mut run) = setup(1);
        // pipe_distance 220, width 70: spawn once right + 220 < 400, i.e. x < 110
        run.obstacles = vec![open_obstacle(113)];
        update_obstacles(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles.len(), 1);

        update_obstacles(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles.len(), 2);
        assert_eq!(run.obstacles[0].x, 107);
        assert_eq!(run.obstacles[1].x, 107 + 220);
    }

    #[test]
    fn test_empty_list_reseeds() {
        let (params, condition, mut generator, mut run) = setup(1);
        run.obstacles.clear();
        update_obstacles(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles.len(), 1);
        assert_eq!(run.obstacles[0].x, 500);
    }

    #[test]
    fn test_score_increments_once_per_obstacle() {
        let (params, condition, mut generator, mut run) = setup(1);
        // center = x + 35; avatar at 100 passes when center < 100
        run.obstacles = vec![open_obstacle(68)];
        run.avatar.y = 300.0;

        tick(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles[0].x, 65);
        assert_eq!(run.score, 0);

        run.avatar.velocity = -0.5;
        tick(&mut run, &condition, &mut generator, &params);
        assert_eq!(run.obstacles[0].x, 62);
        assert!(run.obstacles[0].passed);
        assert_eq!(run.score, 1);

        for _ in 0..5 {
            run.avatar.velocity = -0.5;
            tick(&mut run, &condition, &mut generator, &params);
        }
        assert_eq!(run.score, 1);
    }

    #[test]
    fn test_ceiling_breach_terminates_same_tick() {
        let (params, condition, mut generator, mut run) = setup(1);
        run.avatar.y = 20.0;
        run.avatar.velocity = -6.5;
        // velocity -6.0, y 14.0
        let outcome = tick(&mut run, &condition, &mut generator, &params);
        assert_eq!(outcome, TickOutcome::Terminate(Termination::Ceiling));
    }

    #[test]
    fn test_terminating_tick_still_scores() {
        let (params, condition, mut generator, mut run) = setup(1);
        // Center moves 100 -> 97 while the avatar breaks the ceiling
        run.obstacles = vec![open_obstacle(65)];
        run.avatar.y = 20.0;
        run.avatar.velocity = -6.5;

        let outcome = tick(&mut run, &condition, &mut generator, &params);
        assert_eq!(outcome, TickOutcome::Terminate(Termination::Ceiling));
        assert!(run.obstacles[0].passed);
        assert_eq!(run.score, 1);
    }

    #[test]
    fn test_free_fall_hits_ground() {
        let (params, condition, mut generator, mut run) = setup(1);
        let mut outcome = TickOutcome::Continue;
        for _ in 0..200 {
            outcome = tick(&mut run, &condition, &mut generator, &params);
            if outcome != TickOutcome::Continue {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::Terminate(Termination::Ground));
    }

    #[test]
    fn test_determinism() {
        let (params, condition, mut gen1, mut run1) = setup(99999);
        let (_, _, mut gen2, mut run2) = setup(99999);
        for i in 0..30 {
            if i % 10 == 0 {
                run1.avatar.jump(condition.jump_power);
                run2.avatar.jump(condition.jump_power);
            }
            tick(&mut run1, &condition, &mut gen1, &params);
            tick(&mut run2, &condition, &mut gen2, &params);
        }
        assert_eq!(run1.avatar, run2.avatar);
        assert_eq!(run1.obstacles, run2.obstacles);
    }

    proptest! {
        #[test]
        fn prop_velocity_never_exceeds_terminal(
            start_velocity in -20.0f32..20.0,
            jumps in proptest::collection::vec(any::<bool>(), 1..120),
        ) {
            let (mut params, condition, mut generator, mut run) = setup(5);
            params.field_height = 1_000_000;
            run.avatar.velocity = start_velocity;
            for jump in jumps {
                if jump {
                    run.avatar.jump(condition.jump_power);
                }
                tick(&mut run, &condition, &mut generator, &params);
                prop_assert!(run.avatar.velocity <= params.max_fall_speed);
            }
        }

        #[test]
        fn prop_obstacles_stay_sorted_and_spaced(seed in any::<u64>(), steps in 1usize..600) {
            let (params, condition, mut generator, mut run) = setup(seed);
            for _ in 0..steps {
                update_obstacles(&mut run, &condition, &mut generator, &params);
                prop_assert!(run.is_sorted());
                prop_assert!(run.obstacles.iter().all(|o| o.right() >= 0));
                for pair in run.obstacles.windows(2) {
                    prop_assert_eq!(pair[1].x - pair[0].x, condition.pipe_distance);
                }
            }
        }

        #[test]
        fn prop_score_matches_passed_obstacles(seed in any::<u64>(), steps in 1usize..400) {
            let (params, condition, mut generator, mut run) = setup(seed);
            let mut last_score = 0;
            for _ in 0..steps {
                // Hover in the middle of the field, ignoring collisions
                run.avatar.y = 350.0;
                run.avatar.velocity = -params.gravity;
                update_obstacles(&mut run, &condition, &mut generator, &params);
                run.score += update_score(&mut run);
                prop_assert!(run.score >= last_score);
                prop_assert!(run.score - last_score <= 1);
                last_score = run.score;
            }
        }
    }
}
