//! Capture of user input timing for one segment.
//!
//! Hold mode records one press-hold duration per beat; tap mode records
//! the gaps between tap onsets. A capture window ends when enough
//! intervals arrive or when input goes idle for too long, in which case
//! whatever was collected (possibly nothing) goes to evaluation.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::config::RhythmConfig;

/// How user input is turned into intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// One interval per press-hold duration.
    Hold,
    /// One interval per gap between consecutive tap onsets.
    Tap,
}

/// Records user reply intervals for the segment being captured.
#[derive(Debug, Clone)]
pub struct CaptureEngine {
    /// Input mode.
    pub mode: CaptureMode,
    /// Seconds without input before the window force-ends.
    pub idle_gap: f32,
    /// Lower clamp for a hold duration.
    pub clamp_min: f32,
    /// Upper clamp for a hold duration.
    pub clamp_max: f32,
    required: usize,
    intervals: Vec<f32>,
    capturing: bool,
    press_start: Option<f32>,
    last_tap: Option<f32>,
    last_event: Option<f32>,
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Hold,
            idle_gap: 0.9,
            clamp_min: 0.05,
            clamp_max: 1.50,
            required: 0,
            intervals: Vec::new(),
            capturing: false,
            press_start: None,
            last_tap: None,
            last_event: None,
        }
    }
}

impl CaptureEngine {
    /// Engine matching a session configuration.
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self {
            mode: if config.hold_mode {
                CaptureMode::Hold
            } else {
                CaptureMode::Tap
            },
            idle_gap: config.capture_idle_gap,
            clamp_min: config.hold_clamp_min,
            clamp_max: config.hold_clamp_max,
            ..Self::default()
        }
    }

    /// Open a capture window for `required` intervals, clearing any
    /// prior capture and resetting the idle clock.
    pub fn begin(&mut self, required: usize, now: f32) {
        self.required = required;
        self.intervals.clear();
        self.capturing = true;
        self.press_start = None;
        self.last_tap = None;
        self.last_event = Some(now);
    }

    /// Close the window without evaluating.
    pub fn abort(&mut self) {
        self.capturing = false;
        self.press_start = None;
    }

    /// True while the window accepts input.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// True while a press is in progress inside the window.
    pub fn is_held(&self) -> bool {
        self.capturing && self.press_start.is_some()
    }

    /// Duration of the current press, 0 when none.
    pub fn held_seconds(&self, now: f32) -> f32 {
        match self.press_start {
            Some(start) if self.capturing => (now - start).max(0.0),
            _ => 0.0,
        }
    }

    /// Intervals recorded so far.
    pub fn intervals(&self) -> &[f32] {
        &self.intervals
    }

    /// Register a press at `now`. Returns `true` when this press
    /// completed the window (tap mode only).
    pub fn on_press(&mut self, now: f32) -> bool {
        if !self.capturing {
            return false;
        }
        self.last_event = Some(now);
        match self.mode {
            CaptureMode::Hold => {
                self.press_start = Some(now);
                false
            }
            CaptureMode::Tap => {
                let mut done = false;
                if let Some(last) = self.last_tap {
                    self.intervals.push(now - last);
                    done = self.complete_if_filled();
                }
                self.last_tap = Some(now);
                done
            }
        }
    }

    /// Register a release at `now`. Returns `true` when the recorded
    /// hold completed the window.
    pub fn on_release(&mut self, now: f32) -> bool {
        if !self.capturing {
            return false;
        }
        let Some(start) = self.press_start else {
            return false;
        };
        self.press_start = None;
        self.last_event = Some(now);

        if self.mode == CaptureMode::Hold {
            let hold = (now - start).clamp(self.clamp_min, self.clamp_max);
            self.intervals.push(hold);
            return self.complete_if_filled();
        }
        false
    }

    /// Idle-timeout fallback. Returns `true` when the window was
    /// force-ended because no input arrived for `idle_gap` seconds.
    pub fn tick(&mut self, now: f32) -> bool {
        if !self.capturing {
            return false;
        }
        // an in-flight press is activity: never time out mid-hold, or
        // holds longer than the idle gap could never be recorded
        if self.press_start.is_some() {
            return false;
        }
        match self.last_event {
            Some(last) if now - last >= self.idle_gap => {
                self.capturing = false;
                self.press_start = None;
                log::debug!(
                    "capture idle timeout with {} interval(s)",
                    self.intervals.len()
                );
                true
            }
            _ => false,
        }
    }

    fn complete_if_filled(&mut self) -> bool {
        if self.intervals.len() >= self.required {
            self.capturing = false;
            self.press_start = None;
            true
        } else {
            false
        }
    }
}
