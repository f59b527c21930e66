//! Game session: phase state machine, input surface and event dispatch
//!
//! The session owns the level set, the upgrade levels handed in by the
//! upgrade screen, and the live [`GameState`]. Phase changes come from the
//! caller (menus, key presses) except two that the simulation drives: a
//! cleared level and a player who has run out of health.

use std::error::Error;

use glam::Vec2;

use crate::sim::hazards::Hazard;
use crate::sim::level::{LevelError, LevelSet};
use crate::sim::state::{Ball, Bat, Brick, GameEvent, GameState};
use crate::sim::tick::{TickInput, tick};
use crate::sim::upgrades::UpgradeLevels;
use crate::timestep::FixedTimestep;
use crate::tuning::{Tuning, TuningError};

/// Screen the game is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// Title screen, nothing loaded
    #[default]
    Intro,
    /// Simulation running
    Playing,
    /// Frozen; still rendered
    Paused,
    /// All destructible bricks gone
    LevelComplete,
    /// Upgrade shop between levels
    Upgrade,
    GameOver,
    Options,
}

/// Failure reported by an event listener
pub type ListenerError = Box<dyn Error + Send + Sync>;

/// External subscriber to gameplay events (audio, achievements, leaderboards)
///
/// Errors are logged and dropped; they never interrupt the simulation.
pub trait EventListener {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), ListenerError>;
}

/// A running game
pub struct Session {
    levels: LevelSet,
    upgrades: UpgradeLevels,
    tuning: Tuning,
    seed: u64,
    phase: GamePhase,
    state: Option<GameState>,
    current_level: Option<u32>,
    stepper: FixedTimestep,
    input: TickInput,
    last_time: Option<f64>,
    /// Seconds left before the game-over screen, once health hits zero
    game_over_timer: Option<f32>,
    /// Where closing the options screen goes back to
    options_return: GamePhase,
    listeners: Vec<Box<dyn EventListener>>,
}

impl Session {
    /// Create a session at the intro screen
    ///
    /// Tuning that the simulation cannot run with is rejected here, before
    /// any frame is driven.
    pub fn new(levels: LevelSet, tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        let stepper = FixedTimestep::new(tuning.fixed_step, tuning.max_frame_delta);
        Ok(Self {
            levels,
            upgrades: UpgradeLevels::new(),
            tuning,
            seed,
            phase: GamePhase::Intro,
            state: None,
            current_level: None,
            stepper,
            input: TickInput::default(),
            last_time: None,
            game_over_timer: None,
            options_return: GamePhase::Intro,
            listeners: Vec::new(),
        })
    }

    /// Start with upgrades already owned (e.g. from a save)
    pub fn with_upgrades(mut self, upgrades: UpgradeLevels) -> Self {
        self.upgrades = upgrades;
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn upgrades(&self) -> &UpgradeLevels {
        &self.upgrades
    }

    pub fn current_level(&self) -> Option<u32> {
        self.current_level
    }

    /// Live state of the level being played
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::info!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    // === Lifecycle ===

    /// Load `level_id` and start playing it
    ///
    /// On failure the session is left exactly as it was.
    pub fn start_game(&mut self, level_id: u32) -> Result<(), LevelError> {
        let level = self.levels.load(level_id)?;
        let snapshot = self.upgrades.snapshot();

        // Replacing the state drops every live entity of the previous level
        self.state = Some(GameState::new(level, snapshot, self.tuning.clone(), self.seed));
        self.current_level = Some(level_id);
        self.stepper.reset();
        self.last_time = None;
        self.game_over_timer = None;
        self.input = TickInput::default();
        self.set_phase(GamePhase::Playing);
        Ok(())
    }

    /// Replay the current level from scratch
    pub fn restart(&mut self) -> Result<(), LevelError> {
        let id = match self.current_level.or_else(|| self.levels.first_id()) {
            Some(id) => id,
            None => return Err(LevelError::NotFound { id: 0 }),
        };
        self.start_game(id)
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.set_phase(GamePhase::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.stepper.reset();
            self.set_phase(GamePhase::Playing);
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            _ => {}
        }
    }

    /// Open the options screen; a running game is paused first
    pub fn open_options(&mut self) {
        if self.phase == GamePhase::Options {
            return;
        }
        self.options_return = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            other => other,
        };
        self.set_phase(GamePhase::Options);
    }

    pub fn close_options(&mut self) {
        if self.phase == GamePhase::Options {
            self.set_phase(self.options_return);
        }
    }

    /// Leave the level-complete screen for the upgrade shop
    pub fn open_upgrade_screen(&mut self) {
        if self.phase == GamePhase::LevelComplete {
            self.set_phase(GamePhase::Upgrade);
        }
    }

    /// Leave the upgrade shop with the player's new upgrade levels
    ///
    /// This is the only point where upgrades re-enter the simulation. Loads
    /// the next level and returns true, or returns to the intro when the
    /// level set is exhausted.
    pub fn exit_upgrade_screen(&mut self, upgrades: UpgradeLevels) -> Result<bool, LevelError> {
        if self.phase != GamePhase::Upgrade {
            log::warn!("Ignoring upgrade-screen exit during {:?}", self.phase);
            return Ok(false);
        }
        self.upgrades = upgrades;

        let next = self
            .current_level
            .and_then(|id| self.levels.next_after(id));
        match next {
            Some(id) => {
                self.start_game(id)?;
                Ok(true)
            }
            None => {
                log::info!("All levels complete");
                self.return_to_intro();
                Ok(false)
            }
        }
    }

    /// Drop the level and go back to the title screen
    pub fn return_to_intro(&mut self) {
        self.state = None;
        self.current_level = None;
        self.game_over_timer = None;
        self.set_phase(GamePhase::Intro);
    }

    // === Frame loop ===

    /// Per-render-frame entry point; `now` is a timestamp in seconds
    ///
    /// Runs as many fixed simulation ticks as the elapsed time allows while
    /// playing, dispatches the events they produced and applies any
    /// simulation-driven phase change. Returns the number of ticks run.
    pub fn frame(&mut self, now: f64) -> u32 {
        let delta = match self.last_time {
            Some(last) => (now - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);

        if self.phase != GamePhase::Playing {
            return 0;
        }
        let Some(state) = self.state.as_mut() else {
            return 0;
        };

        let input = &self.input;
        let steps = self.stepper.advance(delta, |dt| tick(state, input, dt));
        if steps > 0 {
            // The pointer is a one-shot target; held keys persist
            self.input.pointer = None;
        }

        let events = state.drain_events();
        let cleared = state.cleared;
        let dead = state.is_player_dead();
        self.dispatch(&events);

        if cleared {
            self.game_over_timer = None;
            self.finish_level(GamePhase::LevelComplete);
        } else if dead {
            let remaining = self
                .game_over_timer
                .get_or_insert(self.tuning.game_over_delay);
            *remaining -= delta.min(self.tuning.max_frame_delta);
            if *remaining <= 0.0 {
                self.game_over_timer = None;
                self.finish_level(GamePhase::GameOver);
            }
        }
        steps
    }

    /// Leave play: live hazards and shots vanish with the screen change
    fn finish_level(&mut self, phase: GamePhase) {
        if let Some(state) = self.state.as_mut() {
            state.clear_live_entities();
        }
        self.set_phase(phase);
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            log::debug!("Event: {:?}", event);
            for listener in &mut self.listeners {
                if let Err(err) = listener.on_event(event) {
                    log::warn!("Event listener failed on {:?}: {}", event, err);
                }
            }
        }
    }

    // === Input surface ===

    /// Center the bat on the pointer at the next tick
    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.input.pointer = Some(Vec2::new(x, y));
    }

    pub fn move_left(&mut self, held: bool) {
        self.input.left = held;
    }

    pub fn move_right(&mut self, held: bool) {
        self.input.right = held;
    }

    pub fn move_up(&mut self, held: bool) {
        self.input.up = held;
    }

    pub fn move_down(&mut self, held: bool) {
        self.input.down = held;
    }

    /// Piercing power-up: every destructible brick is pierced for `seconds`
    pub fn grant_piercing(&mut self, seconds: f32) {
        if let Some(state) = self.state.as_mut() {
            state.ball.grant_piercing(seconds);
        }
    }

    // === Read-only views for the renderer ===

    pub fn active_bricks(&self) -> impl Iterator<Item = &Brick> {
        self.state
            .iter()
            .flat_map(|s| s.level.active_bricks().map(|(_, b)| b))
    }

    pub fn hazards(&self) -> &[Hazard] {
        match &self.state {
            Some(state) => state.hazards.hazards(),
            None => &[],
        }
    }

    pub fn ball(&self) -> Option<&Ball> {
        self.state.as_ref().map(|s| &s.ball)
    }

    pub fn bat(&self) -> Option<&Bat> {
        self.state.as_ref().map(|s| &s.bat)
    }

    pub fn health(&self) -> i32 {
        self.state.as_ref().map_or(0, |s| s.health)
    }
}
