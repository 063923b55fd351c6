//! Flappy Rig entry point
//!
//! Terminal front end: stdin lines are read on a helper thread and marshalled
//! onto the single tick thread, which runs the fixed-timestep loop and prints
//! a text rendition of each screen.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use flappy_rig::experiment::{Experiment, Frame, Phase};
use flappy_rig::persistence::CsvRecorder;
use flappy_rig::platform::{MonotonicClock, ParticipantPrompt};
use flappy_rig::settings::Settings;
use flappy_rig::sim::autopilot;
use flappy_rig::ui::Action;

/// Maximum ticks run per loop iteration to prevent spiral of death
const MAX_SUBSTEPS: u32 = 8;

const HELP: &str = "\
commands:
  <enter> | j      jump
  s | start        start a trial
  t | try          next condition (after Game Over)
  n | new          new participant
  q | exit         quit
  click X Y        click at field coordinates
  f | frame        dump the current frame as JSON
  ? | help         this text";

/// Parsed command line
struct Args {
    settings_path: Option<String>,
    autopilot: bool,
    print_settings: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = Args {
            settings_path: None,
            autopilot: false,
            print_settings: false,
        };
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--autopilot" => args.autopilot = true,
                "--print-settings" => args.print_settings = true,
                _ => args.settings_path = Some(arg),
            }
        }
        args
    }
}

/// Reads participant ids from the shared stdin channel
struct StdinPrompt<'a> {
    lines: &'a Receiver<String>,
}

impl ParticipantPrompt for StdinPrompt<'_> {
    fn request_participant_id(&mut self) -> Option<String> {
        print!("Participant ID (e.g. P01): ");
        let _ = io::stdout().flush();
        // A closed stdin counts as a cancelled prompt
        self.lines.recv().ok()
    }
}

/// Rig instance holding the experiment and front-end state
struct Rig {
    experiment: Experiment<MonotonicClock, CsvRecorder>,
    lines: Receiver<String>,
    autopilot: bool,
    tick: Duration,
    accumulator: Duration,
    last_time: Instant,
    /// Phase, participant and protocol position last printed
    last_screen: Option<(Phase, String, usize, u32)>,
    last_score: u32,
}

impl Rig {
    fn new(settings: &Settings, lines: Receiver<String>, autopilot: bool) -> Self {
        let recorder = CsvRecorder::new(&settings.results_path);
        Self {
            experiment: Experiment::new(settings, MonotonicClock::new(), recorder),
            lines,
            autopilot,
            tick: Duration::from_millis(settings.tick_ms),
            accumulator: Duration::ZERO,
            last_time: Instant::now(),
            last_screen: None,
            last_score: 0,
        }
    }

    /// Handle one stdin command
    fn handle_line(&mut self, line: &str) {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("");
        let action = match command {
            "" | "j" | "jump" => {
                self.experiment.on_jump();
                return;
            }
            "s" | "start" => Action::Start,
            "t" | "try" | "a" | "advance" => Action::Advance,
            "n" | "new" => Action::NewParticipant,
            "q" | "quit" | "exit" => Action::Exit,
            "click" => {
                let coords: Vec<f32> = words.filter_map(|w| w.parse().ok()).collect();
                if let [x, y] = coords.as_slice() {
                    let mut prompt = StdinPrompt { lines: &self.lines };
                    if let Err(notice) = self.experiment.on_pointer_click(*x, *y, &mut prompt) {
                        println!("! {notice}");
                    }
                } else {
                    println!("usage: click X Y");
                }
                return;
            }
            "f" | "frame" => {
                match serde_json::to_string_pretty(&self.experiment.frame()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => log::error!("Failed to serialize frame: {}", e),
                }
                return;
            }
            "?" | "help" => {
                println!("{HELP}");
                return;
            }
            other => {
                println!("unknown command '{other}' (? for help)");
                return;
            }
        };

        let mut prompt = StdinPrompt { lines: &self.lines };
        if let Err(notice) = self.experiment.perform(action, &mut prompt) {
            println!("! {notice}");
        }
    }

    /// Drain pending input, run due ticks, redraw. Returns false when the rig should stop.
    fn update(&mut self) -> bool {
        loop {
            match self.lines.try_recv() {
                Ok(line) => self.handle_line(line.trim()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("Input closed");
                    if let Err(notice) = self.experiment.on_exit() {
                        log::debug!("Exit on closed input rejected: {}", notice);
                    }
                    break;
                }
            }
        }

        let now = Instant::now();
        if self.experiment.is_ticking() {
            self.accumulator += now - self.last_time;
        } else {
            self.accumulator = Duration::ZERO;
        }
        self.last_time = now;

        let mut substeps = 0;
        while self.experiment.is_ticking() && self.accumulator >= self.tick && substeps < MAX_SUBSTEPS
        {
            if self.autopilot
                && self
                    .experiment
                    .trial()
                    .is_some_and(|run| autopilot::wants_jump(run, self.experiment.params()))
            {
                self.experiment.on_jump();
            }
            self.experiment.on_tick();
            self.accumulator -= self.tick;
            substeps += 1;
        }

        self.render();
        self.experiment.phase() != Phase::Exited
    }

    /// Print the screen when something visible changed
    fn render(&mut self) {
        let frame = self.experiment.frame();
        let screen = (
            frame.phase,
            frame.participant_id.clone(),
            frame.condition_number,
            frame.trial_index,
        );
        if self.last_screen.as_ref() != Some(&screen) {
            self.last_screen = Some(screen);
            self.last_score = frame.score;
            print_screen(&frame);
        } else if frame.phase == Phase::Running && frame.score != self.last_score {
            self.last_score = frame.score;
            println!("score {}", frame.score);
        }
    }
}

fn print_screen(frame: &Frame) {
    println!(
        "Participant: {}  Cond: {} ({}/{})",
        frame.participant_id, frame.condition_name, frame.condition_number, frame.condition_total
    );
    match frame.phase {
        Phase::Menu => println!("== FlappyBird == type 's' to begin"),
        Phase::Running => println!(
            "-- trial {} running -- Jump: {}  Dist: {}  Hole: {}",
            frame.trial_index, frame.jump_power, frame.pipe_distance, frame.hole_size
        ),
        Phase::GameOver => println!(
            "== GAME OVER == Last Survival: {:.2} s  Score: {}",
            frame.last_survival_ms.unwrap_or(0) as f64 / 1000.0,
            frame.score
        ),
        Phase::Exited => println!("Bye."),
    }
    if !frame.controls.is_empty() {
        let labels: Vec<_> = frame.controls.iter().map(|c| c.label).collect();
        println!("[{}]", labels.join("] ["));
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Flappy Rig starting...");

    let args = Args::parse();
    let settings = match &args.settings_path {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    if args.print_settings {
        return match settings.to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    log::info!("Recording outcomes to {}", settings.results_path.display());
    let lines = spawn_stdin_reader();
    let mut rig = Rig::new(&settings, lines, args.autopilot);

    {
        let mut prompt = StdinPrompt { lines: &rig.lines };
        if let Err(notice) = rig.experiment.on_new_participant(&mut prompt) {
            log::debug!("Initial participant prompt rejected: {}", notice);
        }
    }
    println!("{HELP}");

    while rig.update() {
        let elapsed = rig.last_time.elapsed();
        if elapsed < rig.tick {
            thread::sleep(rig.tick - elapsed);
        }
    }

    ExitCode::SUCCESS
}
