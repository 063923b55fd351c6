//! Deterministic simulation module
//!
//! All per-tick gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Obstacles kept in ascending x order
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::Termination;
pub use spawn::ObstacleGenerator;
pub use state::{Avatar, Obstacle, SimParams, TrialRun};
pub use tick::{TickOutcome, tick};
