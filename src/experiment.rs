//! Trial/session protocol state machine
//!
//! Owns the participant session, the condition catalog and the running
//! trial. All input arrives through the `on_*` handlers on a single thread;
//! illegal actions are rejected with a `ProtocolViolation` and leave the
//! state untouched.
//!
//! ```text
//! Menu --start--> Running --terminate--> GameOver --advance--> Running
//!   ^                                       |  \--start------> Running
//!   \------------- new participant ---------/
//! ```

use glam::Vec2;
use serde::Serialize;
use thiserror::Error;

use crate::conditions::{Condition, conditions};
use crate::persistence::{OutcomeRecord, OutcomeSink};
use crate::platform::{Clock, ParticipantPrompt};
use crate::settings::Settings;
use crate::sim::{
    Avatar, Obstacle, ObstacleGenerator, SimParams, Termination, TickOutcome, TrialRun, tick,
};
use crate::ui::{self, Action, Control};

/// Externally visible experiment phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Waiting for a trial to be started
    Menu,
    /// A trial is being simulated
    Running,
    /// The last trial ended; its survival time is available
    GameOver,
    /// The rig was shut down; no further actions are accepted
    Exited,
}

/// Internal state. A `TrialRun` exists exactly while running.
#[derive(Debug)]
enum Stage {
    Menu,
    Running(TrialRun),
    GameOver,
    Exited,
}

/// An action that is not allowed in the current state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("A trial is in progress. Wait for Game Over first.")]
    TrialInProgress,
    #[error("Finish a trial with the current condition before moving on.")]
    NoFinishedTrial,
    #[error(
        "All {total} conditions are completed for this participant. Use New Game for the next participant."
    )]
    AllConditionsCompleted { total: usize },
    #[error("The session has ended.")]
    SessionClosed,
}

/// Participant identity and protocol position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub participant_id: String,
    /// 1-based, counts completed trials + 1
    pub trial_index: u32,
    /// Position in the condition catalog
    pub condition_index: usize,
}

impl Session {
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            trial_index: 1,
            condition_index: 0,
        }
    }
}

/// Obstacle geometry for drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObstacleView {
    pub x: i32,
    pub width: i32,
    pub gap_top: i32,
    pub gap_bottom: i32,
}

impl From<&Obstacle> for ObstacleView {
    fn from(o: &Obstacle) -> Self {
        Self {
            x: o.x,
            width: o.width,
            gap_top: o.gap_top,
            gap_bottom: o.gap_bottom(),
        }
    }
}

/// Everything needed to draw one frame, with no game logic left to do
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub phase: Phase,
    pub field_width: i32,
    pub field_height: i32,
    pub ground_y: i32,
    pub avatar: Option<Vec2>,
    pub avatar_radius: i32,
    pub obstacles: Vec<ObstacleView>,
    pub score: u32,
    pub participant_id: String,
    pub trial_index: u32,
    pub condition_name: String,
    /// 1-based
    pub condition_number: usize,
    pub condition_total: usize,
    pub jump_power: f32,
    pub pipe_distance: i32,
    pub hole_size: i32,
    pub last_survival_ms: Option<u64>,
    pub notice: Option<String>,
    pub controls: Vec<Control>,
}

/// The experiment rig
pub struct Experiment<C: Clock, S: OutcomeSink> {
    params: SimParams,
    placeholder: String,
    catalog: Vec<Condition>,
    session: Session,
    stage: Stage,
    generator: ObstacleGenerator,
    clock: C,
    sink: S,
    last_survival_ms: Option<u64>,
    last_score: Option<u32>,
    notice: Option<ProtocolViolation>,
}

impl<C: Clock, S: OutcomeSink> Experiment<C, S> {
    pub fn new(settings: &Settings, clock: C, sink: S) -> Self {
        let generator = match settings.seed {
            Some(seed) => ObstacleGenerator::seeded(&settings.sim, seed),
            None => ObstacleGenerator::from_entropy(&settings.sim),
        };
        log::info!("Obstacle seed: {}", generator.seed());

        let mut catalog = settings.levels.catalog();
        if catalog.is_empty() {
            log::warn!("Configured condition levels are empty, using the standard catalog");
            catalog = conditions();
        }

        Self {
            params: settings.sim.clone(),
            placeholder: settings.placeholder_participant.clone(),
            catalog,
            session: Session::new(settings.placeholder_participant.clone()),
            stage: Stage::Menu,
            generator,
            clock,
            sink,
            last_survival_ms: None,
            last_score: None,
            notice: None,
        }
    }

    // === Input handlers ===

    /// Start a trial with the current condition (from Menu or GameOver)
    pub fn on_start(&mut self) -> Result<(), ProtocolViolation> {
        match self.stage {
            Stage::Exited => self.reject(ProtocolViolation::SessionClosed),
            Stage::Running(_) => self.reject(ProtocolViolation::TrialInProgress),
            Stage::Menu | Stage::GameOver => {
                self.begin_trial();
                Ok(())
            }
        }
    }

    /// Move to the next condition and start a trial with it
    pub fn on_advance_condition(&mut self) -> Result<(), ProtocolViolation> {
        match self.stage {
            Stage::Exited => self.reject(ProtocolViolation::SessionClosed),
            Stage::Running(_) => self.reject(ProtocolViolation::TrialInProgress),
            Stage::Menu => self.reject(ProtocolViolation::NoFinishedTrial),
            Stage::GameOver => {
                let total = self.catalog.len();
                if self.session.condition_index + 1 >= total {
                    return self.reject(ProtocolViolation::AllConditionsCompleted { total });
                }
                self.session.condition_index += 1;
                log::info!(
                    "Advanced to condition {} ({}/{})",
                    self.condition().name,
                    self.session.condition_index + 1,
                    total
                );
                self.begin_trial();
                Ok(())
            }
        }
    }

    /// Hand the rig to a new participant. Blank or cancelled answers get the placeholder id.
    pub fn on_new_participant(
        &mut self,
        prompt: &mut dyn ParticipantPrompt,
    ) -> Result<(), ProtocolViolation> {
        match self.stage {
            Stage::Exited => return self.reject(ProtocolViolation::SessionClosed),
            Stage::Running(_) => return self.reject(ProtocolViolation::TrialInProgress),
            Stage::Menu | Stage::GameOver => {}
        }

        let participant_id = prompt
            .request_participant_id()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.placeholder.clone());
        log::info!("New participant: {}", participant_id);

        self.session = Session::new(participant_id);
        self.stage = Stage::Menu;
        self.last_survival_ms = None;
        self.last_score = None;
        self.notice = None;
        Ok(())
    }

    /// Shut the rig down. A running trial is discarded without a record.
    pub fn on_exit(&mut self) -> Result<(), ProtocolViolation> {
        match self.stage {
            Stage::Exited => return self.reject(ProtocolViolation::SessionClosed),
            Stage::Running(_) => log::warn!(
                "Exiting during trial {} of {}; trial not recorded",
                self.session.trial_index,
                self.session.participant_id
            ),
            Stage::Menu | Stage::GameOver => {}
        }
        log::info!("Experiment exited");
        self.stage = Stage::Exited;
        self.notice = None;
        Ok(())
    }

    /// Jump input. Returns false (and does nothing) unless a trial is running.
    pub fn on_jump(&mut self) -> bool {
        let Stage::Running(run) = &mut self.stage else {
            return false;
        };
        let jump_power = self.catalog[self.session.condition_index].jump_power;
        run.avatar.jump(jump_power);
        true
    }

    /// Advance the running trial by one step. Returns the outcome record when the trial ends.
    pub fn on_tick(&mut self) -> Option<OutcomeRecord> {
        let Stage::Running(run) = &mut self.stage else {
            return None;
        };
        let condition = &self.catalog[self.session.condition_index];
        let TickOutcome::Terminate(termination) =
            tick(run, condition, &mut self.generator, &self.params)
        else {
            return None;
        };

        let Stage::Running(run) = std::mem::replace(&mut self.stage, Stage::GameOver) else {
            return None;
        };
        Some(self.finish_trial(run, termination))
    }

    /// Route a click to whichever visible control contains it
    pub fn on_pointer_click(
        &mut self,
        x: f32,
        y: f32,
        prompt: &mut dyn ParticipantPrompt,
    ) -> Result<Option<Action>, ProtocolViolation> {
        if let Stage::Exited = self.stage {
            return self.reject(ProtocolViolation::SessionClosed);
        }
        let phase = self.phase();
        let Some(action) = ui::hit_test(
            phase,
            self.params.field_width,
            self.params.field_height,
            Vec2::new(x, y),
        ) else {
            return Ok(None);
        };
        self.perform(action, prompt)?;
        Ok(Some(action))
    }

    /// Dispatch a semantic action
    pub fn perform(
        &mut self,
        action: Action,
        prompt: &mut dyn ParticipantPrompt,
    ) -> Result<(), ProtocolViolation> {
        match action {
            Action::Start => self.on_start(),
            Action::Advance => self.on_advance_condition(),
            Action::NewParticipant => self.on_new_participant(prompt),
            Action::Exit => self.on_exit(),
        }
    }

    // === Transitions ===

    fn begin_trial(&mut self) {
        let now = self.clock.now_ms();
        let condition = &self.catalog[self.session.condition_index];
        let run = TrialRun::new(&self.params, condition, &mut self.generator, now);

        log::info!(
            "Participant {} trial {} START: condition {} (jump {}, distance {}, hole {})",
            self.session.participant_id,
            self.session.trial_index,
            condition.name,
            condition.jump_power,
            condition.pipe_distance,
            condition.hole_size
        );

        self.stage = Stage::Running(run);
        self.notice = None;
    }

    fn finish_trial(&mut self, run: TrialRun, termination: Termination) -> OutcomeRecord {
        let survival_ms = run.elapsed_ms(self.clock.now_ms());
        let record = OutcomeRecord::new(
            &self.session.participant_id,
            self.session.trial_index,
            &self.catalog[self.session.condition_index],
            survival_ms,
        );

        log::info!(
            "Participant {} trial {} END: {:?} after {} ms ({:.2} s), condition {}, score {}",
            record.participant_id,
            record.trial_index,
            termination,
            survival_ms,
            survival_ms as f64 / 1000.0,
            record.condition_name,
            run.score
        );

        if let Err(e) = self.sink.append(&record) {
            log::error!("Failed to record trial {}: {}", record.trial_index, e);
        }

        self.session.trial_index += 1;
        self.last_survival_ms = Some(survival_ms);
        self.last_score = Some(run.score);
        record
    }

    fn reject<T>(&mut self, violation: ProtocolViolation) -> Result<T, ProtocolViolation> {
        log::warn!("Rejected action: {}", violation);
        self.notice = Some(violation.clone());
        Err(violation)
    }

    // === Render query surface ===

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Menu => Phase::Menu,
            Stage::Running(_) => Phase::Running,
            Stage::GameOver => Phase::GameOver,
            Stage::Exited => Phase::Exited,
        }
    }

    /// Whether the tick source should be delivering ticks
    pub fn is_ticking(&self) -> bool {
        matches!(self.stage, Stage::Running(_))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &[Condition] {
        &self.catalog
    }

    /// Active condition
    pub fn condition(&self) -> &Condition {
        &self.catalog[self.session.condition_index]
    }

    pub fn trial(&self) -> Option<&TrialRun> {
        match &self.stage {
            Stage::Running(run) => Some(run),
            _ => None,
        }
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.trial().map(|run| &run.avatar)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.trial().map(|run| run.obstacles.as_slice()).unwrap_or(&[])
    }

    /// Score of the running trial, or of the last finished one
    pub fn score(&self) -> u32 {
        self.trial()
            .map(|run| run.score)
            .or(self.last_score)
            .unwrap_or(0)
    }

    pub fn last_survival_ms(&self) -> Option<u64> {
        self.last_survival_ms
    }

    /// Last rejected action, cleared by the next successful transition
    pub fn notice(&self) -> Option<&ProtocolViolation> {
        self.notice.as_ref()
    }

    /// Visible controls and their hit regions
    pub fn controls(&self) -> Vec<Control> {
        ui::controls(self.phase(), self.params.field_width, self.params.field_height)
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn frame(&self) -> Frame {
        let condition = self.condition();
        Frame {
            phase: self.phase(),
            field_width: self.params.field_width,
            field_height: self.params.field_height,
            ground_y: self.params.ground_y(),
            avatar: self.avatar().map(Avatar::pos),
            avatar_radius: self.params.avatar_radius,
            obstacles: self.obstacles().iter().map(ObstacleView::from).collect(),
            score: self.score(),
            participant_id: self.session.participant_id.clone(),
            trial_index: self.session.trial_index,
            condition_name: condition.name.clone(),
            condition_number: self.session.condition_index + 1,
            condition_total: self.catalog.len(),
            jump_power: condition.jump_power,
            pipe_distance: condition.pipe_distance,
            hole_size: condition.hole_size,
            last_survival_ms: self.last_survival_ms,
            notice: self.notice.as_ref().map(ToString::to_string),
            controls: self.controls(),
        }
    }
}
