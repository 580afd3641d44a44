//! Time-driven playback of a target pattern.
//!
//! An explicit state machine replaces frame-coroutine waiting: every
//! non-idle state carries a wake-at time, and `tick` advances through
//! all states that have come due. Pulses are strictly ordered and never
//! overlap; playback always runs to completion unless stopped.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::config::RhythmConfig;
use crate::pattern::Pattern;
use crate::traits::HapticSink;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Settle { wake: f32 },
    LeadIn { wake: f32 },
    Pulse { index: usize, wake: f32 },
    Gap { index: usize, wake: f32 },
}

/// Plays one pattern as a sequence of haptic pulses with inter-beat
/// gaps and an optional accented beat.
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    /// Delay before playback reacts at all.
    pub settle_delay: f32,
    /// Lead-in after settle, before the first beat.
    pub lead_in: f32,
    /// Silence between beats.
    pub inter_beat_gap: f32,
    /// Base pulse amplitude.
    pub amplitude: f32,
    /// Extra amplitude for the accented beat.
    pub accent_boost: f32,
    accent_index: Option<usize>,
    beats: Vec<f32>,
    state: State,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self {
            settle_delay: 0.03,
            lead_in: 0.15,
            inter_beat_gap: 0.45,
            amplitude: 0.7,
            accent_boost: 0.15,
            accent_index: None,
            beats: Vec::new(),
            state: State::Idle,
        }
    }
}

impl PlaybackEngine {
    /// Engine matching a session configuration.
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self {
            settle_delay: config.settle_delay,
            lead_in: config.lead_in,
            inter_beat_gap: config.inter_beat_gap,
            amplitude: config.amplitude,
            accent_boost: config.accent_boost,
            ..Self::default()
        }
    }

    /// Schedule playback of `pattern` starting at `now`.
    ///
    /// Not reentrant: a call while a pattern is in flight is a no-op
    /// and returns `false`.
    pub fn play(&mut self, pattern: &Pattern, accent_index: Option<usize>, now: f32) -> bool {
        if self.is_playing() {
            log::debug!("play ignored, pattern already in flight");
            return false;
        }
        self.beats = pattern.beats.clone();
        self.accent_index = accent_index.map(|i| i.min(self.beats.len().saturating_sub(1)));
        self.state = State::Settle {
            wake: now + self.settle_delay,
        };
        true
    }

    /// True while a pattern is scheduled or sounding.
    pub fn is_playing(&self) -> bool {
        self.state != State::Idle
    }

    /// Abort playback immediately.
    pub fn stop(&mut self) {
        self.state = State::Idle;
    }

    /// Advance through every state that has come due at `now`.
    ///
    /// Returns `true` exactly when playback completed during this call.
    /// Wake times chain off the scheduled times, not off `now`, so a
    /// coarse tick cadence never stretches the pattern.
    pub fn tick<H: HapticSink>(&mut self, now: f32, sink: &mut H) -> bool {
        loop {
            match self.state {
                State::Idle => return false,
                State::Settle { wake } if now >= wake => {
                    self.state = State::LeadIn {
                        wake: wake + self.lead_in,
                    };
                }
                State::LeadIn { wake } if now >= wake => {
                    if self.beats.is_empty() {
                        self.state = State::Idle;
                        return true;
                    }
                    self.emit(0, sink);
                    self.state = State::Pulse {
                        index: 0,
                        wake: wake + self.beats[0],
                    };
                }
                State::Pulse { index, wake } if now >= wake => {
                    self.state = State::Gap {
                        index,
                        wake: wake + self.inter_beat_gap,
                    };
                }
                State::Gap { index, wake } if now >= wake => {
                    let next = index + 1;
                    if next < self.beats.len() {
                        self.emit(next, sink);
                        self.state = State::Pulse {
                            index: next,
                            wake: wake + self.beats[next],
                        };
                    } else {
                        self.state = State::Idle;
                        return true;
                    }
                }
                _ => return false,
            }
        }
    }

    fn emit<H: HapticSink>(&self, index: usize, sink: &mut H) {
        let boost = if self.accent_index == Some(index) {
            self.accent_boost
        } else {
            0.0
        };
        sink.pulse(self.beats[index], (self.amplitude + boost).clamp(0.0, 1.0));
    }
}
