//! Flappy Rig - a side-scrolling reflex game used as an HCI experiment rig
//!
//! Core modules:
//! - `conditions`: The fixed factorial catalog of difficulty conditions
//! - `sim`: Deterministic per-tick simulation (physics, obstacles, collisions, scoring)
//! - `experiment`: Participant/trial protocol state machine and render query surface
//! - `persistence`: Append-only outcome records
//! - `platform`: Capabilities the core calls out to (clock, participant prompt)
//! - `settings`: Data-driven configuration
//! - `ui`: Semantic actions and on-screen control regions

pub mod conditions;
pub mod experiment;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod ui;

pub use conditions::{Condition, ConditionLevels, conditions};
pub use experiment::{Experiment, Frame, Phase, ProtocolViolation, Session};
pub use persistence::{CsvRecorder, MemoryRecorder, OutcomeRecord, OutcomeSink, RecorderError};
pub use settings::{Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Nominal tick period (~60 Hz)
    pub const TICK_MS: u64 = 16;

    /// Playfield dimensions
    pub const FIELD_WIDTH: i32 = 400;
    pub const FIELD_HEIGHT: i32 = 700;
    /// Distance from the bottom edge to the ground line used for collisions
    pub const GROUND_MARGIN: i32 = 50;

    /// Avatar defaults
    pub const AVATAR_X: i32 = FIELD_WIDTH / 4;
    pub const AVATAR_RADIUS: i32 = 14;

    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.5;
    /// Terminal fall velocity per tick
    pub const MAX_FALL_SPEED: f32 = 15.0;

    /// Obstacle defaults
    pub const OBSTACLE_WIDTH: i32 = 70;
    /// Horizontal scroll per tick
    pub const SCROLL_SPEED: i32 = 3;
    /// Smallest allowed gap top (margin from the top edge)
    pub const GAP_TOP_MARGIN: i32 = 100;
    /// Space kept free below the lowest possible gap
    pub const GAP_FLOOR_MARGIN: i32 = 200;
    /// Range widening applied when a hole is too large for the field
    pub const GAP_RANGE_SLACK: i32 = 10;
    /// Obstacles placed ahead of the avatar when a trial starts
    pub const INITIAL_OBSTACLES: usize = 3;
    /// Offset past the right edge of the first pre-placed obstacle
    pub const FIRST_OBSTACLE_OFFSET: i32 = 200;
    /// Offset past the right edge when the obstacle list has emptied
    pub const RESPAWN_OFFSET: i32 = 100;

    /// Condition axes
    pub const JUMP_LEVELS: [f32; 3] = [8.0, 10.0, 12.0];
    pub const PIPE_DISTANCE_LEVELS: [i32; 2] = [220, 260];
    pub const HOLE_SIZE_LEVELS: [i32; 2] = [160, 200];

    /// Identity used when the participant prompt is blank or cancelled
    pub const PLACEHOLDER_PARTICIPANT: &str = "Unknown";
    /// Default outcome file
    pub const RESULTS_PATH: &str = "results.csv";
}
