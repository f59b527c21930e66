//! Fixed-timestep accumulator
//!
//! Decouples the simulation rate from the render rate. Each frame's delta is
//! banked; whole steps are drained from the bank and the remainder carries
//! over to the next frame.

use crate::consts::SIM_DT;

/// Frame-delta accumulator that hands out constant-size simulation steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    /// Deltas above this are clamped (tab switches, debugger pauses)
    max_frame_delta: f32,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(SIM_DT, 0.25)
    }
}

impl FixedTimestep {
    /// A step that is not a positive finite number falls back to [`SIM_DT`]
    pub fn new(step: f32, max_frame_delta: f32) -> Self {
        let step = if step > 0.0 && step.is_finite() {
            step
        } else {
            log::warn!("Invalid fixed step {}, using {}", step, SIM_DT);
            SIM_DT
        };
        Self {
            step,
            accumulator: 0.0,
            max_frame_delta: max_frame_delta.max(step),
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Time banked but not yet simulated
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Bank `delta` seconds and run `on_step` once per whole step available
    ///
    /// Returns the number of steps run.
    pub fn advance<F>(&mut self, delta: f32, mut on_step: F) -> u32
    where
        F: FnMut(f32),
    {
        if !delta.is_finite() || delta <= 0.0 {
            return 0;
        }
        self.accumulator += delta.min(self.max_frame_delta);

        let mut steps = 0;
        while self.accumulator >= self.step {
            on_step(self.step);
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// Fraction of a step left in the bank, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }

    /// Drop banked time (after a pause or screen change)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
